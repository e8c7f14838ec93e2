//! File-backed state store.
//!
//! State is written to a single file, JSON by default or YAML when the
//! path ends in `.yaml`/`.yml`. A missing file loads as the initial state,
//! so the first call of a new workflow needs no setup.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use super::{StateStore, StoreError};
use crate::workflow::state::WorkflowState;

/// On-disk serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFormat {
    Json,
    Yaml,
}

impl StateFormat {
    /// Picks the format from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

/// What actually lands on disk.
#[derive(Serialize, Deserialize, Debug)]
struct StateFile {
    #[serde(flatten)]
    state: WorkflowState,

    saved_at: DateTime<Utc>,
}

/// Persists workflow state to a file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    format: StateFormat,
}

impl FileStore {
    /// Creates a store for `path`; the format follows the file extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = StateFormat::from_path(&path);
        Self { path, format }
    }

    /// Creates a store with an explicit format, ignoring the extension.
    pub fn with_format(path: impl Into<PathBuf>, format: StateFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> StateFormat {
        self.format
    }

    /// Returns when the state was last saved, `None` if never saved.
    pub fn saved_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.read()?.map(|file| file.saved_at))
    }

    /// Removes the state file. Missing files are not an error.
    pub fn delete(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Deleted state file: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&self) -> Result<Option<StateFile>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file = match self.format {
            StateFormat::Json => serde_json::from_str(&content)?,
            StateFormat::Yaml => serde_yaml::from_str(&content)?,
        };
        Ok(Some(file))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for FileStore {
    fn load(&self) -> Result<WorkflowState, StoreError> {
        match self.read()? {
            Some(file) => {
                debug!(
                    "Loaded workflow state from {} (stage {})",
                    self.path.display(),
                    file.state.current_stage
                );
                Ok(file.state)
            }
            None => {
                debug!("No state file at {}, starting fresh", self.path.display());
                Ok(WorkflowState::default())
            }
        }
    }

    fn save(&self, state: &WorkflowState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = StateFile {
            state: state.clone(),
            saved_at: Utc::now(),
        };
        let content = match self.format {
            StateFormat::Json => serde_json::to_string_pretty(&file)?,
            StateFormat::Yaml => serde_yaml::to_string(&file)?,
        };

        // Write-then-rename so a crash mid-write never leaves a torn file.
        let temp = self.temp_path();
        fs::write(&temp, content)?;
        fs::rename(&temp, &self.path)?;

        debug!("Saved workflow state to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::StageResult;
    use tempfile::tempdir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(StateFormat::from_path(Path::new("a.yaml")), StateFormat::Yaml);
        assert_eq!(StateFormat::from_path(Path::new("a.YML")), StateFormat::Yaml);
        assert_eq!(StateFormat::from_path(Path::new("a.json")), StateFormat::Json);
        assert_eq!(StateFormat::from_path(Path::new("a.state")), StateFormat::Json);
    }

    #[test]
    fn test_missing_file_loads_initial_state() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("absent.json"));

        assert!(store.load().unwrap().is_initial());
        assert!(store.saved_at().unwrap().is_none());
    }

    #[test]
    fn test_json_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("nested/dir/flow.json"));
        let state = WorkflowState::at(1, Some(StageResult::encode(&serde_json::json!({"name": "Peter"})).unwrap()));

        store.save(&state).unwrap();
        assert!(store.path().exists());
        assert!(!store.temp_path().exists());
        assert!(store.saved_at().unwrap().is_some());

        let loaded = FileStore::new(store.path()).load().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_yaml_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("flow.yaml"));
        assert_eq!(store.format(), StateFormat::Yaml);

        let state = WorkflowState::at(2, Some(StageResult::encode(&vec![1, 2]).unwrap()));
        store.save(&state).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("current_stage: 2"));
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("flow.json");
        fs::write(&path, "not json").unwrap();

        let err = FileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
    }

    #[test]
    fn test_delete() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("flow.json"));

        store.save(&WorkflowState::new()).unwrap();
        store.delete().unwrap();
        assert!(!store.path().exists());

        // Deleting again is fine
        assert!(store.delete().is_ok());
    }

    #[test]
    fn test_save_fails_when_parent_is_a_file() {
        let temp_dir = tempdir().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let store = FileStore::with_format(blocker.join("flow.json"), StateFormat::Json);
        assert!(matches!(store.save(&WorkflowState::new()), Err(StoreError::Io(_))));
    }

    #[test]
    fn test_non_utf8_payload_survives_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("flow.json"));
        let state = WorkflowState::at(1, Some(StageResult::from_bytes(vec![0xff, 0x00])));

        store.save(&state).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, state);
        assert_eq!(loaded.pending_result.unwrap().as_bytes(), &[0xff, 0x00]);
    }

    #[test]
    fn test_text_payloads_survive_both_formats() {
        let temp_dir = tempdir().unwrap();
        let payloads = ["null", "true", "42", "\"yes\"", "\"~\"", "\"\"", "1.5e300", "\"a\\nb\""];

        for file_name in ["flow.json", "flow.yaml"] {
            let store = FileStore::new(temp_dir.path().join(file_name));
            for payload in payloads {
                let state = WorkflowState::at(1, Some(StageResult::from_bytes(payload)));
                store.save(&state).unwrap();
                assert_eq!(store.load().unwrap(), state, "{} in {}", payload, file_name);
            }
        }
    }
}
