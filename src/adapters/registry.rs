use crate::adapters::write_atomically;
use crate::domain::ports::ModuleResource;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersionRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_version: Option<String>,
}

/// Module version registry table kept as a JSON file, one row per module.
#[derive(Debug, Clone)]
pub struct JsonModuleRegistry {
    path: PathBuf,
}

impl JsonModuleRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn rows(&self) -> Result<BTreeMap<String, ModuleVersionRow>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&content)?)
    }

    fn write_rows(&self, rows: &BTreeMap<String, ModuleVersionRow>) -> Result<()> {
        let data = serde_json::to_vec_pretty(rows)?;
        write_atomically(&self.path, &data)
    }
}

impl ModuleResource for JsonModuleRegistry {
    fn db_version(&self, module: &str) -> Result<Option<String>> {
        Ok(self
            .rows()?
            .remove(module)
            .and_then(|row| row.schema_version)
            .filter(|version| !version.is_empty()))
    }

    fn delete_version(&self, module: &str) -> Result<()> {
        let mut rows = self.rows()?;
        if rows.remove(module).is_some() {
            self.write_rows(&rows)?;
            tracing::debug!(module = %module, "Removed module registry row");
        }
        Ok(())
    }
}
