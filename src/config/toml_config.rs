use crate::utils::error::{Result, UninstallError};
use crate::utils::validation::{validate_path, validate_relative_path, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the application keeps the files the uninstaller touches. Every path
/// is relative to the application root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub deployment: DeploymentLayout,
    pub modules: ModulesLayout,
    pub cleanup: CleanupLayout,
    pub backup: BackupLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentLayout {
    /// JSON deployment configuration with the `install` and `modules` sections.
    pub config: String,
    /// Root composer file whose `require` keys are the installed packages.
    pub composer: String,
    pub maintenance_flag: String,
}

impl Default for DeploymentLayout {
    fn default() -> Self {
        Self {
            config: "app/etc/config.json".to_string(),
            composer: "composer.json".to_string(),
            maintenance_flag: "var/.maintenance.flag".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesLayout {
    /// Directories searched for `module.toml` manifests.
    pub dirs: Vec<String>,
    /// Module version registry table.
    pub registry: String,
}

impl Default for ModulesLayout {
    fn default() -> Self {
        Self {
            dirs: vec!["app/code".to_string()],
            registry: "var/setup_module.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupLayout {
    pub cache: Vec<String>,
    pub generated: Vec<String>,
    pub static_content: Vec<String>,
}

impl Default for CleanupLayout {
    fn default() -> Self {
        Self {
            cache: vec!["var/cache".to_string(), "var/page_cache".to_string()],
            generated: vec!["generated".to_string()],
            static_content: vec![
                "pub/static".to_string(),
                "var/view_preprocessed".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupLayout {
    pub dir: String,
    /// Paths left out of code backups.
    pub ignore_paths: Vec<String>,
}

impl Default for BackupLayout {
    fn default() -> Self {
        Self {
            dir: "var/backups".to_string(),
            ignore_paths: vec![
                ".git".to_string(),
                "var".to_string(),
                "pub/static".to_string(),
                "pub/media".to_string(),
                "generated".to_string(),
            ],
        }
    }
}

impl LayoutConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(UninstallError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| UninstallError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are left
    /// untouched.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| UninstallError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for LayoutConfig {
    fn validate(&self) -> Result<()> {
        validate_relative_path("deployment.config", &self.deployment.config)?;
        validate_relative_path("deployment.composer", &self.deployment.composer)?;
        validate_relative_path("deployment.maintenance_flag", &self.deployment.maintenance_flag)?;
        validate_relative_path("modules.registry", &self.modules.registry)?;
        validate_relative_path("backup.dir", &self.backup.dir)?;

        let lists = [
            ("modules.dirs", &self.modules.dirs),
            ("cleanup.cache", &self.cleanup.cache),
            ("cleanup.generated", &self.cleanup.generated),
            ("cleanup.static_content", &self.cleanup.static_content),
        ];
        for (field, paths) in lists {
            for path in paths {
                validate_relative_path(field, path)?;
            }
        }
        for path in &self.backup.ignore_paths {
            validate_path("backup.ignore_paths", path)?;
        }

        Ok(())
    }
}
