//! Where finished runs go

use super::{Result, Run, TrackingError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Persistence for runs
pub trait TrackingBackend {
    fn save_run(&mut self, run: &Run) -> Result<()>;

    fn load_run(&self, run_id: &str) -> Result<Run>;

    fn list_runs(&self) -> Result<Vec<Run>>;
}

/// One pretty-printed JSON file per run, `{dir}/{run_id}.json`
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// The directory is created on first save
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.dir.join(format!("{run_id}.json"))
    }

    fn read_run(path: &Path) -> Result<Run> {
        let json = fs::read_to_string(path).map_err(|source| TrackingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl TrackingBackend for JsonFileBackend {
    fn save_run(&mut self, run: &Run) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| TrackingError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.run_path(&run.run_id);
        let json = serde_json::to_string_pretty(run)?;
        fs::write(&path, json).map_err(|source| TrackingError::Io { path, source })
    }

    fn load_run(&self, run_id: &str) -> Result<Run> {
        let path = self.run_path(run_id);
        if !path.exists() {
            return Err(TrackingError::RunNotFound(run_id.to_string()));
        }
        Self::read_run(&path)
    }

    fn list_runs(&self) -> Result<Vec<Run>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|source| TrackingError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut runs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                runs.push(Self::read_run(&path)?);
            }
        }
        runs.sort_by(|a, b| a.run_id.cmp(&b.run_id));
        Ok(runs)
    }
}

/// Keeps runs in memory
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    runs: BTreeMap<String, Run>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrackingBackend for InMemoryBackend {
    fn save_run(&mut self, run: &Run) -> Result<()> {
        self.runs.insert(run.run_id.clone(), run.clone());
        Ok(())
    }

    fn load_run(&self, run_id: &str) -> Result<Run> {
        self.runs
            .get(run_id)
            .cloned()
            .ok_or_else(|| TrackingError::RunNotFound(run_id.to_string()))
    }

    fn list_runs(&self) -> Result<Vec<Run>> {
        Ok(self.runs.values().cloned().collect())
    }
}
