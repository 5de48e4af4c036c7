pub mod toml_config;

pub use toml_config::LayoutConfig;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
mod cli {
    use crate::domain::model::{ModuleRequest, UninstallOptions};
    use crate::utils::error::{Result, UninstallError};
    use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "module-uninstall")]
    #[command(about = "Uninstalls modules and removes their registry entries, caches and data")]
    #[command(version)]
    pub struct CliConfig {
        /// Name of the module(s) to uninstall
        #[arg(required = true, num_args = 1..)]
        pub modules: Vec<String>,

        /// Clear generated static view files
        #[arg(short = 'c', long)]
        pub clear_static_content: bool,

        /// Remove data installed by the module(s)
        #[arg(short = 'r', long)]
        pub remove_data: bool,

        /// Take a code backup before uninstalling
        #[arg(long)]
        pub backup_code: bool,

        /// Application root directory
        #[arg(long, default_value = ".")]
        pub root: PathBuf,

        /// TOML file overriding the default application layout
        #[arg(long)]
        pub config: Option<PathBuf>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl CliConfig {
        pub fn options(&self) -> UninstallOptions {
            UninstallOptions {
                clear_static_content: self.clear_static_content,
                remove_data: self.remove_data,
                backup_code: self.backup_code,
            }
        }

        pub fn request(&self) -> Result<ModuleRequest> {
            ModuleRequest::new(self.modules.iter().cloned()).ok_or_else(|| {
                UninstallError::MissingConfigError {
                    field: "module".to_string(),
                }
            })
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("root", &self.root.to_string_lossy())?;
            for module in &self.modules {
                validate_non_empty_string("module", module)?;
            }
            Ok(())
        }
    }

}
