//! Plan file storage
//!
//! Directory structure:
//! ~/.nestegg/
//!   plan.yaml            # Accounts, expenses, retirement and market inputs
//!   nestegg.log          # Rotating log file
//!   scenarios/
//!     retire_at_60.yaml  # Saved scenario overrides

use std::fs;
use std::path::{Path, PathBuf};

use nestegg_core::ScenarioOverrides;

use super::plan_data::PlanData;

/// Error types for storage operations
#[derive(Debug)]
pub enum StorageError {
    Io(String),
    Parse(String),
    Serialize(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(msg) => write!(f, "IO error: {}", msg),
            StorageError::Parse(msg) => write!(f, "Parse error: {}", msg),
            StorageError::Serialize(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Manages the data directory holding the plan and saved scenarios
pub struct DataDirectory {
    root: PathBuf,
}

impl DataDirectory {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the default data directory path (~/.nestegg/)
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".nestegg")
    }

    /// Get the path to plan.yaml
    pub fn plan_path(&self) -> PathBuf {
        self.root.join("plan.yaml")
    }

    fn scenarios_dir(&self) -> PathBuf {
        self.root.join("scenarios")
    }

    fn scenario_path(&self, name: &str) -> PathBuf {
        self.scenarios_dir()
            .join(format!("{}.yaml", sanitize_filename(name)))
    }

    /// Check if the data directory exists and has been initialized
    pub fn exists(&self) -> bool {
        self.root.exists() && self.scenarios_dir().exists()
    }

    /// Initialize the data directory structure
    pub fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| StorageError::Io(format!("Failed to create data directory: {}", e)))?;
        fs::create_dir_all(self.scenarios_dir()).map_err(|e| {
            StorageError::Io(format!("Failed to create scenarios directory: {}", e))
        })?;
        Ok(())
    }

    /// Load a plan from an explicit path
    pub fn load_plan_from(&self, path: &Path) -> Result<PlanData, StorageError> {
        let content = fs::read_to_string(path).map_err(|e| {
            StorageError::Io(format!("Failed to read plan {}: {}", path.display(), e))
        })?;

        PlanData::from_yaml(&content)
            .map_err(|e| StorageError::Parse(format!("Failed to parse plan: {}", e)))
    }

    /// Load plan.yaml from the data directory
    pub fn load_plan(&self) -> Result<PlanData, StorageError> {
        self.load_plan_from(&self.plan_path())
    }

    /// Write plan.yaml, creating the directory structure if needed
    pub fn save_plan(&self, plan: &PlanData) -> Result<(), StorageError> {
        if !self.exists() {
            self.init()?;
        }

        let yaml = plan
            .to_yaml()
            .map_err(|e| StorageError::Serialize(format!("Failed to serialize plan: {}", e)))?;

        fs::write(self.plan_path(), yaml)
            .map_err(|e| StorageError::Io(format!("Failed to write plan: {}", e)))
    }

    /// Load saved scenario overrides by name
    pub fn load_scenario(&self, name: &str) -> Result<ScenarioOverrides, StorageError> {
        load_overrides(&self.scenario_path(name))
    }

    /// Save scenario overrides under `name`
    pub fn save_scenario(
        &self,
        name: &str,
        overrides: &ScenarioOverrides,
    ) -> Result<(), StorageError> {
        if !self.exists() {
            self.init()?;
        }

        let yaml = serde_saphyr::to_string(overrides)
            .map_err(|e| StorageError::Serialize(format!("Failed to serialize scenario: {}", e)))?;

        fs::write(self.scenario_path(name), yaml)
            .map_err(|e| StorageError::Io(format!("Failed to write scenario: {}", e)))
    }

    /// Names of saved scenarios, sorted
    pub fn scenario_names(&self) -> Result<Vec<String>, StorageError> {
        let scenarios_dir = self.scenarios_dir();
        if !scenarios_dir.exists() {
            return Ok(vec![]);
        }

        let entries = fs::read_dir(&scenarios_dir).map_err(|e| {
            StorageError::Io(format!("Failed to read scenarios directory: {}", e))
        })?;
        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Get the root path of the data directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Load scenario overrides from any YAML file
pub fn load_overrides(path: &Path) -> Result<ScenarioOverrides, StorageError> {
    let content = fs::read_to_string(path).map_err(|e| {
        StorageError::Io(format!("Failed to read scenario {}: {}", path.display(), e))
    })?;

    serde_saphyr::from_str(&content)
        .map_err(|e| StorageError::Parse(format!("Failed to parse scenario: {}", e)))
}

/// Sanitize a filename to be safe for the filesystem
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
