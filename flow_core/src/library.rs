//! Workout library persistence with file locking.
//!
//! The execution engine never touches storage; this module is the
//! persistence collaborator that hands it assembled `Workout` trees.
//! Each workout is stored as `<id>.json` in the library directory.

use crate::validate::is_valid_id;
use crate::{Error, Result, Workout};
use chrono::Utc;
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Written after the first seeding; not a `.json` file, so `list` ignores it
const SEED_MARKER: &str = ".seeded";

/// Read access to stored workouts, plus the authoring writes the CLI needs
pub trait WorkoutRepository {
    fn get(&self, id: &str) -> Result<Option<Workout>>;
    fn list(&self) -> Result<Vec<Workout>>;
    fn save(&self, workout: &Workout) -> Result<()>;
    fn delete(&self, id: &str) -> Result<bool>;

    /// Like `get`, but a missing workout is an error
    fn require(&self, id: &str) -> Result<Workout> {
        self.get(id)?.ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

/// Directory of JSON workout files
pub struct JsonLibrary {
    dir: PathBuf,
}

impl JsonLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if !is_valid_id(id) {
            return Err(Error::Other(format!("Invalid workout id '{}'", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    /// Write the built-in catalog the first time this library is opened
    ///
    /// A marker file records the first run, so a library the user has
    /// emptied stays empty. Returns the number of workouts written.
    pub fn seed_defaults(&self) -> Result<usize> {
        let marker = self.dir.join(SEED_MARKER);
        if marker.exists() {
            return Ok(0);
        }

        let mut written = 0;
        if self.list()?.is_empty() {
            let catalog = crate::get_default_catalog();
            for workout in catalog {
                self.write(workout)?;
            }
            written = catalog.len();
            tracing::info!("Seeded library with {} default workouts", written);
        }

        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&marker, b"")?;
        Ok(written)
    }

    /// Read one workout file under a shared lock
    ///
    /// Stored files are checked against the authoring limits again, so a
    /// hand-edited file cannot hand the engine out-of-range values.
    fn read(path: &Path) -> Result<Workout> {
        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let workout: Workout = serde_json::from_str(&contents)?;
        let errors = workout.validate();
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }
        Ok(workout)
    }

    /// Atomically write a workout file
    ///
    /// Writes to a locked temp file in the same directory, syncs it, then
    /// renames it over the target.
    fn write(&self, workout: &Workout) -> Result<()> {
        let path = self.path_for(&workout.id)?;
        std::fs::create_dir_all(&self.dir)?;

        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(workout)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved workout '{}' to {:?}", workout.name, path);
        Ok(())
    }
}

impl WorkoutRepository for JsonLibrary {
    fn get(&self, id: &str) -> Result<Option<Workout>> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    /// All readable, valid workouts sorted by name; other files are skipped
    fn list(&self) -> Result<Vec<Workout>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut workouts = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path) {
                Ok(workout) => workouts.push(workout),
                Err(e) => {
                    tracing::warn!("Skipping unusable workout file {:?}: {}", path, e);
                }
            }
        }

        workouts.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(workouts)
    }

    /// Validate and store a workout, stamping `updated_at`
    fn save(&self, workout: &Workout) -> Result<()> {
        let errors = workout.validate();
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        let mut stamped = workout.clone();
        stamped.updated_at = Utc::now();
        self.write(&stamped)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let path = self.path_for(id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Deleted workout {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
