use clap::Parser;
use module_uninstall::adapters::build_parts;
use module_uninstall::utils::{logger, validation::Validate};
use module_uninstall::{CliConfig, LayoutConfig, ModuleUninstaller, Result, UninstallError};

fn main() {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(&config) {
        if e.is_reported() {
            tracing::debug!("Module uninstall stopped: {} (Category: {:?})", e, e.category());
        } else {
            tracing::error!(
                "Module uninstall failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("Suggestion: {}", e.recovery_suggestion());
            eprintln!("{}", e.user_friendly_message());
        }
        std::process::exit(e.exit_code());
    }
}

fn run(config: &CliConfig) -> Result<()> {
    config.validate()?;

    let layout = load_layout(config)?;
    layout.validate()?;

    let request = config.request()?;
    let uninstaller = ModuleUninstaller::new(build_parts(&config.root, &layout));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let report = uninstaller.run(&request, config.options(), &mut out)?;

    tracing::info!(
        stages = report.stages.len(),
        remaining_modules = report.modules.len(),
        "Uninstall finished"
    );
    Ok(())
}

fn load_layout(config: &CliConfig) -> Result<LayoutConfig> {
    match &config.config {
        Some(path) => {
            tracing::info!("Loading layout from {}", path.display());
            LayoutConfig::from_file(path)
        }
        None => {
            let default_path = config.root.join("uninstall.toml");
            if default_path.is_file() {
                tracing::info!("Loading layout from {}", default_path.display());
                LayoutConfig::from_file(&default_path)
            } else {
                Ok(LayoutConfig::default())
            }
        }
    }
    .map_err(|e| match e {
        UninstallError::IoError(io) => UninstallError::ConfigValidationError {
            field: "config".to_string(),
            message: format!("cannot read layout file: {}", io),
        },
        other => other,
    })
}
