use crate::core::validator::validate_request;
use crate::domain::model::{
    BackupArtifact, ModuleContext, ModuleRegistryState, ModuleRequest, SetupContext,
    UninstallOptions,
};
use crate::domain::ports::{
    CleanupBox, CodeBackupBox, DependencyCheckerBox, DeploymentConfigBox, MaintenanceMode,
    MaintenanceModeBox, ModuleListBox, ModuleResourceBox, PackageInfoBox, UninstallCollectorBox,
};
use crate::domain::stage::{StageTracker, UninstallStage};
use crate::utils::error::{Result, UninstallError};
use std::io::Write;

const STATIC_CONTENT_ALERT: &str = "Alert: Generated static view files were not cleared. \
You can clear them using the --clear-static-content option. Failure to clear static view \
files might cause display issues in the Admin and storefront.";

const COMPOSER_REMOVE_HINT: &str =
    "To completely remove modules, please run 'composer remove <package-name>' for each module";

/// Collaborators the uninstaller drives. Every store is external and reached
/// only through these handles.
pub struct UninstallerParts {
    pub deployment_config: DeploymentConfigBox,
    pub package_info: PackageInfoBox,
    pub module_list: ModuleListBox,
    pub dependency_checker: DependencyCheckerBox,
    pub module_resource: ModuleResourceBox,
    pub maintenance_mode: MaintenanceModeBox,
    pub cleanup: CleanupBox,
    pub code_backup: CodeBackupBox,
    pub uninstall_collector: UninstallCollectorBox,
    pub setup: SetupContext,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallReport {
    pub stages: Vec<UninstallStage>,
    pub backup: Option<BackupArtifact>,
    pub already_uninstalled: Vec<String>,
    pub data_removed: Vec<String>,
    pub modules: ModuleRegistryState,
}

/// Sequences a module uninstall and writes a transcript of every step.
pub struct ModuleUninstaller {
    parts: UninstallerParts,
}

/// Turns maintenance mode off when dropped unless released explicitly.
struct MaintenanceGuard<'a> {
    mode: &'a dyn MaintenanceMode,
    released: bool,
}

impl<'a> MaintenanceGuard<'a> {
    fn new(mode: &'a dyn MaintenanceMode) -> Self {
        Self {
            mode,
            released: false,
        }
    }

    fn release(mut self) -> Result<()> {
        self.released = true;
        self.mode.set(false)
    }
}

impl Drop for MaintenanceGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.mode.set(false) {
                tracing::error!("Failed to disable maintenance mode: {}", e);
            }
        }
    }
}

struct DestructiveOutcome {
    backup: Option<BackupArtifact>,
    already_uninstalled: Vec<String>,
    data_removed: Vec<String>,
    modules: ModuleRegistryState,
}

impl ModuleUninstaller {
    pub fn new(parts: UninstallerParts) -> Self {
        Self { parts }
    }

    pub fn run<W: Write>(
        &self,
        request: &ModuleRequest,
        options: UninstallOptions,
        out: &mut W,
    ) -> Result<UninstallReport> {
        self.run_tracked(request, options, out, &mut StageTracker::new())
    }

    /// Like [`run`](Self::run), recording every stage in `tracker`. On error
    /// the tracker ends in [`UninstallStage::Failed`].
    pub fn run_tracked<W: Write>(
        &self,
        request: &ModuleRequest,
        options: UninstallOptions,
        out: &mut W,
        tracker: &mut StageTracker,
    ) -> Result<UninstallReport> {
        tracing::info!(modules = %request.joined(), ?options, "Starting module uninstall");

        match self.execute(request, options, out, tracker) {
            Ok(outcome) => {
                tracing::info!("Module uninstall completed");
                Ok(UninstallReport {
                    stages: tracker.history().to_vec(),
                    backup: outcome.backup,
                    already_uninstalled: outcome.already_uninstalled,
                    data_removed: outcome.data_removed,
                    modules: outcome.modules,
                })
            }
            Err(e) => {
                if e.is_reported() {
                    tracing::debug!(stage = %tracker.current(), "Module uninstall stopped: {}", e);
                } else {
                    tracing::error!(stage = %tracker.current(), "Module uninstall failed: {}", e);
                }
                tracker.fail();
                Err(e)
            }
        }
    }

    fn execute<W: Write>(
        &self,
        request: &ModuleRequest,
        options: UninstallOptions,
        out: &mut W,
        tracker: &mut StageTracker,
    ) -> Result<DestructiveOutcome> {
        let parts = &self.parts;

        if !parts.deployment_config.is_available()? {
            let err = UninstallError::ApplicationNotInstalled;
            writeln!(out, "{}", err)?;
            return Err(err);
        }

        let issues =
            validate_request(request, parts.package_info.as_ref(), parts.module_list.as_ref())?;
        if !issues.is_empty() {
            for issue in &issues {
                writeln!(out, "{}", issue)?;
            }
            return Err(UninstallError::InvalidModules(issues));
        }
        tracker.advance(UninstallStage::Validated)?;

        let existing = parts.deployment_config.modules()?;
        let violations = parts
            .dependency_checker
            .check_dependencies_when_disabling(request.modules(), &existing.enabled_modules())?;
        if violations.has_violations() {
            for message in violations.messages() {
                writeln!(out, "{}", message)?;
            }
            return Err(UninstallError::DependencyViolation(violations));
        }
        tracker.advance(UninstallStage::DependenciesChecked)?;

        writeln!(out, "Enabling maintenance mode")?;
        parts.maintenance_mode.set(true)?;
        let guard = MaintenanceGuard::new(parts.maintenance_mode.as_ref());
        tracker.advance(UninstallStage::MaintenanceOn)?;

        let outcome = self.destructive_phase(request, options, &existing, out, tracker);

        writeln!(out, "Disabling maintenance mode")?;
        guard.release()?;
        let outcome = outcome?;
        tracker.advance(UninstallStage::MaintenanceOff)?;
        tracker.advance(UninstallStage::Done)?;

        Ok(outcome)
    }

    fn destructive_phase<W: Write>(
        &self,
        request: &ModuleRequest,
        options: UninstallOptions,
        existing: &ModuleRegistryState,
        out: &mut W,
        tracker: &mut StageTracker,
    ) -> Result<DestructiveOutcome> {
        let parts = &self.parts;

        let backup = if options.backup_code {
            let artifact = parts.code_backup.create().map_err(|e| match e {
                UninstallError::BackupFailure { .. } => e,
                other => UninstallError::backup(other.to_string()),
            })?;
            writeln!(
                out,
                "Code backup filename: {} (The archive can be uncompressed with 7-Zip on Windows systems.)",
                artifact.filename
            )?;
            writeln!(out, "Code backup path: {}", artifact.path.display())?;
            writeln!(out, "[SUCCESS]: Code backup is completed successfully.")?;
            tracker.advance(UninstallStage::CodeBackedUp)?;
            Some(artifact)
        } else {
            None
        };

        writeln!(
            out,
            "Removing {} from module registry in database",
            request.joined()
        )?;
        let mut contexts = Vec::with_capacity(request.modules().len());
        let mut already_uninstalled = Vec::new();
        for module in request.modules() {
            match parts.module_resource.db_version(module)? {
                Some(version) => {
                    parts.module_resource.delete_version(module)?;
                    tracing::debug!(module = %module, version = %version, "Deleted registry row");
                    contexts.push(ModuleContext::new(module.clone(), Some(version)));
                }
                None => {
                    writeln!(out, "{} is already uninstalled", module)?;
                    already_uninstalled.push(module.clone());
                    contexts.push(ModuleContext::new(module.clone(), None));
                }
            }
        }
        tracker.advance(UninstallStage::DbCleaned)?;

        writeln!(
            out,
            "Removing {} from module list in deployment configuration",
            request.joined()
        )?;
        let modules: ModuleRegistryState = parts
            .module_list
            .load_excluding(request.modules())?
            .into_iter()
            .filter(|module| !request.contains(module))
            .map(|module| {
                let flag = existing.get(&module).unwrap_or(0);
                (module, flag)
            })
            .collect();
        parts.deployment_config.save_modules(&modules)?;
        tracker.advance(UninstallStage::RegistryRewritten)?;

        parts.cleanup.clean_cache()?;
        writeln!(out, "Cache cleared successfully.")?;
        tracker.advance(UninstallStage::CacheCleared)?;

        parts.cleanup.clear_generated_code()?;
        writeln!(out, "Generated classes cleared successfully.")?;
        tracker.advance(UninstallStage::CodegenCleared)?;

        if options.clear_static_content {
            parts.cleanup.clear_static_content()?;
            writeln!(out, "Generated static view files cleared successfully.")?;
            tracker.advance(UninstallStage::StaticCleared)?;
        } else {
            writeln!(out, "{}", STATIC_CONTENT_ALERT)?;
        }

        let mut data_removed = Vec::new();
        if options.remove_data {
            let routines = parts.uninstall_collector.collect_uninstall()?;
            for context in &contexts {
                match routines.get(&context.module) {
                    Some(routine) => {
                        writeln!(out, "Removing data of {}", context.module)?;
                        routine.uninstall(&parts.setup, context)?;
                        data_removed.push(context.module.clone());
                    }
                    None => {
                        tracing::debug!(module = %context.module, "No data removal routine");
                    }
                }
            }
            tracker.advance(UninstallStage::DataRemoved)?;
        }

        writeln!(out, "{}", COMPOSER_REMOVE_HINT)?;

        Ok(DestructiveOutcome {
            backup,
            already_uninstalled,
            data_removed,
            modules,
        })
    }
}
