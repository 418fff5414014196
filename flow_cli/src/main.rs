use clap::{Parser, Subcommand};
use flow_core::config::AudioConfig;
use flow_core::format::{format_clock, format_duration};
use flow_core::*;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "flowtimer")]
#[command(about = "Interval timer for nested, repeating workouts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List workouts in the library
    List,

    /// Show a workout's sections and flattened steps
    Show {
        /// Workout id
        id: String,
    },

    /// Validate and store a workout from a JSON file
    Import {
        /// Path to the workout JSON
        file: PathBuf,
    },

    /// Remove a workout from the library
    Delete {
        /// Workout id
        id: String,
    },

    /// Run a workout countdown
    ///
    /// While running, enter `p` (pause), `r` (resume), `s` (skip),
    /// `j N` (jump to step N) or `q` (stop).
    Run {
        /// Workout id
        id: String,

        /// Milliseconds per countdown second (overrides config)
        #[arg(long)]
        tick_ms: Option<u64>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    flow_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let library_dir = match cli.data_dir {
        Some(dir) => dir.join("workouts"),
        None => config.library_dir(),
    };

    let library = JsonLibrary::new(library_dir);
    library.seed_defaults()?;

    match cli.command {
        Commands::List => cmd_list(&library),
        Commands::Show { id } => cmd_show(&library, &id),
        Commands::Import { file } => cmd_import(&library, &file),
        Commands::Delete { id } => cmd_delete(&library, &id),
        Commands::Run { id, tick_ms } => cmd_run(&library, &id, tick_ms, &config),
    }
}

fn cmd_list(library: &JsonLibrary) -> Result<()> {
    let workouts = library.list()?;
    if workouts.is_empty() {
        println!("No workouts found.");
        return Ok(());
    }

    for workout in workouts {
        println!(
            "{:<24} {:<28} {:>3} steps  {}",
            workout.id,
            workout.name,
            workout.calculate_total_steps(),
            format_duration(workout.calculate_total_duration())
        );
    }
    Ok(())
}

fn cmd_show(library: &JsonLibrary, id: &str) -> Result<()> {
    let workout = library.require(id)?;

    println!("\n{}", workout.name);
    if let Some(ref description) = workout.description {
        println!("  {}", description);
    }
    println!(
        "  {} steps, {}",
        workout.calculate_total_steps(),
        format_duration(workout.calculate_total_duration())
    );
    println!();

    for section in &workout.sections {
        print_section(section, 1);
    }

    println!("\nSteps:");
    for step in flatten(&workout) {
        println!(
            "  {:>3}. {:<20} {}  ({})",
            step.global_index + 1,
            step.timer.name,
            format_clock(u64::from(step.duration_seconds())),
            repeat_context(&step)
        );
    }
    println!();
    Ok(())
}

fn print_section(section: &Section, indent: usize) {
    let pad = "  ".repeat(indent);
    if section.has_repeats() {
        println!("{}{} x{}", pad, section.name, section.repeat_count);
    } else {
        println!("{}{}", pad, section.name);
    }
    for timer in &section.timers {
        println!("{}  - {} {}", pad, timer.name, timer.formatted_duration());
    }
    for child in &section.children {
        print_section(child, indent + 1);
    }
}

/// "Warrior Flow 1/2 > Right Side" style breadcrumb for a step
fn repeat_context(step: &FlattenedStep) -> String {
    step.frames()
        .map(|frame| {
            if frame.total_repeats > 1 {
                format!(
                    "{} {}/{}",
                    frame.section.name, frame.current_repeat, frame.total_repeats
                )
            } else {
                frame.section.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" > ")
}

fn cmd_import(library: &JsonLibrary, file: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)?;
    let workout: Workout = serde_json::from_str(&contents)?;

    let errors = workout.validate();
    if !errors.is_empty() {
        eprintln!("Workout validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Validation(errors));
    }

    library.save(&workout)?;
    println!(
        "✓ Imported '{}' ({}): {} steps, {}",
        workout.name,
        workout.id,
        workout.calculate_total_steps(),
        format_duration(workout.calculate_total_duration())
    );
    Ok(())
}

fn cmd_delete(library: &JsonLibrary, id: &str) -> Result<()> {
    if library.delete(id)? {
        println!("✓ Deleted {}", id);
        Ok(())
    } else {
        Err(Error::NotFound(id.to_string()))
    }
}

/// Prints announcements and completion cues to the terminal
struct ConsoleListener {
    audio: AudioConfig,
}

impl StepListener for ConsoleListener {
    fn step_started(&self, step: &FlattenedStep) -> Result<()> {
        let spoken = announcement(step);
        for section in &spoken.sections {
            println!("\n== {} ==", section);
        }
        println!(
            "▶ {} ({})",
            spoken.timer,
            format_clock(u64::from(step.duration_seconds()))
        );
        if self.audio.enable_tts {
            tracing::debug!("Speak [{}]: {}", self.audio.tts_language, spoken.text());
        }
        Ok(())
    }

    fn step_completed(&self, step: &FlattenedStep) -> Result<()> {
        if self.audio.enable_sound_effects {
            tracing::debug!(
                "Play '{}' at volume {:.1}",
                self.audio.completion_sound,
                self.audio.sound_volume
            );
        }
        println!("  ✓ {}", step.timer.name);
        Ok(())
    }

    fn workout_completed(&self) -> Result<()> {
        println!("\n✓ Workout complete! Great job!");
        Ok(())
    }
}

enum UserCommand {
    Pause,
    Resume,
    Skip,
    Stop,
    Jump(usize),
}

fn parse_command(line: &str) -> Option<UserCommand> {
    let mut parts = line.split_whitespace();
    let command = match parts.next()?.to_lowercase().as_str() {
        "p" => UserCommand::Pause,
        "r" => UserCommand::Resume,
        "s" => UserCommand::Skip,
        "q" => UserCommand::Stop,
        // Steps are numbered from 1 on screen
        "j" => UserCommand::Jump(parts.next()?.parse::<usize>().ok()?.checked_sub(1)?),
        _ => return None,
    };
    Some(command)
}

fn cmd_run(library: &JsonLibrary, id: &str, tick_ms: Option<u64>, config: &Config) -> Result<()> {
    let workout = library.require(id)?;

    let mut runner_config = config.runner_config();
    if let Some(ms) = tick_ms {
        if ms == 0 {
            return Err(Error::Config("--tick-ms must be positive".into()));
        }
        runner_config.tick_interval = std::time::Duration::from_millis(ms);
    }

    println!(
        "\n{}: {} steps, {}",
        workout.name,
        workout.calculate_total_steps(),
        format_duration(workout.calculate_total_duration())
    );
    println!("Commands: p pause, r resume, s skip, j N jump, q quit");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = Arc::new(ConsoleListener {
            audio: config.audio.clone(),
        });
        let runner = WorkoutRunner::new(tokio::runtime::Handle::current(), runner_config, listener);
        let mut states = runner.subscribe();
        let mut commands = spawn_stdin_reader();
        let mut input_open = true;
        let mut was_paused = false;

        runner.load(workout);
        runner.start();

        loop {
            if runner.snapshot().is_completed() {
                break;
            }

            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = states.borrow_and_update().clone();
                    match state {
                        TimerState::Paused(ref active) if !was_paused => {
                            println!(
                                "⏸ Paused at {} ({} left)",
                                active.step.timer.name,
                                format_clock(u64::from(active.remaining_seconds))
                            );
                        }
                        TimerState::Running(_) if was_paused => println!("▶ Resumed"),
                        TimerState::Completed => break,
                        _ => {}
                    }
                    was_paused = state.is_paused();
                }
                line = commands.recv(), if input_open => match line {
                    Some(line) => match parse_command(&line) {
                        Some(UserCommand::Pause) => runner.pause(),
                        Some(UserCommand::Resume) => runner.resume(),
                        Some(UserCommand::Skip) => runner.skip(),
                        Some(UserCommand::Jump(index)) => runner.jump_to(index),
                        Some(UserCommand::Stop) => {
                            runner.stop();
                            println!(
                                "\n■ Stopped after {}",
                                format_clock(runner.elapsed_seconds())
                            );
                            break;
                        }
                        None => println!("Unknown command: {}", line.trim()),
                    },
                    // No more input; keep counting down
                    None => input_open = false,
                },
            }
        }
    });

    Ok(())
}

/// Forward stdin lines on a plain thread so a blocked read never holds the runtime
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
