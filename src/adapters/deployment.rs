use crate::adapters::write_atomically;
use crate::domain::model::ModuleRegistryState;
use crate::domain::ports::{DeploymentConfig, MaintenanceMode};
use crate::utils::error::{Result, UninstallError};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

const KEY_INSTALL: &str = "install";
const KEY_INSTALL_DATE: &str = "date";
const KEY_MODULES: &str = "modules";

/// Deployment configuration stored as a JSON document.
///
/// ```json
/// { "install": { "date": "2026-01-05T10:00:00Z" }, "modules": { "Vendor_A": 1 } }
/// ```
///
/// Sections other than `modules` are preserved on save.
#[derive(Debug, Clone)]
pub struct JsonDeploymentConfig {
    path: PathBuf,
}

impl JsonDeploymentConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read(&self.path)?;
        match serde_json::from_slice(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(UninstallError::ConfigValidationError {
                field: self.path.display().to_string(),
                message: "deployment configuration must be a JSON object".to_string(),
            }),
        }
    }
}

impl DeploymentConfig for JsonDeploymentConfig {
    fn is_available(&self) -> Result<bool> {
        let document = self.read_document()?;
        let installed = document
            .get(KEY_INSTALL)
            .and_then(|install| install.get(KEY_INSTALL_DATE))
            .and_then(Value::as_str)
            .is_some_and(|date| !date.trim().is_empty());
        Ok(installed)
    }

    fn modules(&self) -> Result<ModuleRegistryState> {
        let document = self.read_document()?;
        let Some(modules) = document.get(KEY_MODULES).and_then(Value::as_object) else {
            return Ok(ModuleRegistryState::new());
        };

        modules
            .iter()
            .map(|(module, flag)| {
                let enabled = match flag {
                    Value::Bool(b) => u8::from(*b),
                    Value::Number(n) => u8::from(n.as_u64().unwrap_or(0) != 0),
                    other => {
                        return Err(UninstallError::ConfigValidationError {
                            field: format!("{}.{}", KEY_MODULES, module),
                            message: format!("expected 0 or 1, found {}", other),
                        })
                    }
                };
                Ok((module.clone(), enabled))
            })
            .collect()
    }

    fn save_modules(&self, modules: &ModuleRegistryState) -> Result<()> {
        let mut document = self.read_document()?;
        let section: Map<String, Value> = modules
            .iter()
            .map(|(module, flag)| (module.to_string(), Value::from(flag)))
            .collect();
        document.insert(KEY_MODULES.to_string(), Value::Object(section));

        let data = serde_json::to_vec_pretty(&Value::Object(document))?;
        write_atomically(&self.path, &data)?;
        tracing::debug!(path = %self.path.display(), modules = modules.len(), "Saved module list");
        Ok(())
    }
}

/// Maintenance mode represented by the presence of a flag file.
#[derive(Debug, Clone)]
pub struct FlagFileMaintenanceMode {
    path: PathBuf,
}

impl FlagFileMaintenanceMode {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MaintenanceMode for FlagFileMaintenanceMode {
    fn set(&self, enabled: bool) -> Result<()> {
        if enabled {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&self.path, b"")?;
        } else if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        tracing::debug!(enabled, "Maintenance mode toggled");
        Ok(())
    }

    fn is_on(&self) -> Result<bool> {
        Ok(self.path.exists())
    }
}
