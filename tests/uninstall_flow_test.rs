mod common;

use common::AppFixture;
use module_uninstall::adapters::build_parts;
use module_uninstall::domain::stage::UninstallStage;
use module_uninstall::{
    LayoutConfig, ModuleRequest, ModuleUninstaller, UninstallError, UninstallOptions,
};

fn run(
    app: &AppFixture,
    modules: &[&str],
    options: UninstallOptions,
) -> (module_uninstall::Result<module_uninstall::UninstallReport>, String) {
    let parts = build_parts(app.root(), &LayoutConfig::default());
    let uninstaller = ModuleUninstaller::new(parts);
    let request = ModuleRequest::new(modules.iter().copied()).unwrap();

    let mut out = Vec::new();
    let result = uninstaller.run(&request, options, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_full_uninstall_with_all_options() {
    let app = AppFixture::installed();
    let options = UninstallOptions {
        clear_static_content: true,
        remove_data: true,
        backup_code: true,
    };

    let (result, transcript) = run(&app, &["Vendor_Review", "Vendor_Catalog"], options);
    let report = result.unwrap();

    // Registry keeps the remaining modules ordered by dependencies, then by name.
    assert_eq!(
        app.config_modules(),
        vec![
            ("Vendor_Admin".to_string(), 0),
            ("Vendor_Local".to_string(), 1),
            ("Vendor_Store".to_string(), 1),
        ]
    );
    assert_eq!(app.json("app/etc/config.json")["db"]["host"], "localhost");
    assert_eq!(app.registry_modules(), vec!["Vendor_Local", "Vendor_Store"]);

    assert!(!app.path("var/import/catalog").exists());
    assert_eq!(report.data_removed, vec!["Vendor_Catalog"]);

    assert!(app.entries("var/cache").is_empty());
    assert!(app.entries("var/page_cache").is_empty());
    assert!(app.entries("generated").is_empty());
    assert_eq!(app.entries("pub/static"), vec![".htaccess"]);
    assert!(!app.path("var/.maintenance.flag").exists());

    let backup = report.backup.expect("backup requested");
    assert!(backup.path.starts_with(app.path("var/backups")));
    assert!(backup.path.exists());

    assert_eq!(
        report.stages,
        vec![
            UninstallStage::NotStarted,
            UninstallStage::Validated,
            UninstallStage::DependenciesChecked,
            UninstallStage::MaintenanceOn,
            UninstallStage::CodeBackedUp,
            UninstallStage::DbCleaned,
            UninstallStage::RegistryRewritten,
            UninstallStage::CacheCleared,
            UninstallStage::CodegenCleared,
            UninstallStage::StaticCleared,
            UninstallStage::DataRemoved,
            UninstallStage::MaintenanceOff,
            UninstallStage::Done,
        ]
    );

    let lines: Vec<&str> = transcript.lines().collect();
    assert_eq!(lines[0], "Enabling maintenance mode");
    assert!(lines[1].starts_with("Code backup filename: "));
    assert!(lines[1].ends_with(
        "_filesystem_code.zip (The archive can be uncompressed with 7-Zip on Windows systems.)"
    ));
    assert!(lines[2].starts_with("Code backup path: "));
    assert_eq!(lines[3], "[SUCCESS]: Code backup is completed successfully.");
    assert_eq!(
        &lines[4..],
        &[
            "Removing Vendor_Review, Vendor_Catalog from module registry in database",
            "Removing Vendor_Review, Vendor_Catalog from module list in deployment configuration",
            "Cache cleared successfully.",
            "Generated classes cleared successfully.",
            "Generated static view files cleared successfully.",
            "Removing data of Vendor_Catalog",
            "To completely remove modules, please run 'composer remove <package-name>' for each module",
            "Disabling maintenance mode",
        ]
    );
}

#[test]
fn test_default_options_leave_static_content_and_data() {
    let app = AppFixture::installed();

    let (result, transcript) = run(&app, &["Vendor_Review"], UninstallOptions::default());
    let report = result.unwrap();

    assert!(report.backup.is_none());
    assert!(report.data_removed.is_empty());
    assert!(app.path("var/import/catalog/products.csv").exists());
    assert!(app.path("pub/static/frontend/theme/styles.css").exists());
    assert!(transcript.contains("Alert: Generated static view files were not cleared."));
    assert!(!transcript.contains("Code backup"));
    assert!(!app.registry_modules().contains(&"Vendor_Review".to_string()));
}

#[test]
fn test_dependency_violation_aborts_before_any_change() {
    let app = AppFixture::installed();
    let config_before = app.read("app/etc/config.json");
    let registry_before = app.read("var/setup_module.json");

    let (result, transcript) = run(&app, &["Vendor_Catalog"], UninstallOptions::default());

    assert!(matches!(result, Err(UninstallError::DependencyViolation(_))));
    assert_eq!(
        transcript,
        "Cannot uninstall module 'Vendor_Catalog' because the following module(s) depend on it:\n\tVendor_Review\n"
    );
    assert_eq!(app.read("app/etc/config.json"), config_before);
    assert_eq!(app.read("var/setup_module.json"), registry_before);
    assert!(app.path("var/cache/mage--a/entry").exists());
    assert!(!app.path("var/.maintenance.flag").exists());
}

#[test]
fn test_transitive_dependents_block_uninstall() {
    let app = AppFixture::installed();

    let (result, transcript) = run(&app, &["Vendor_Store"], UninstallOptions::default());

    let Err(UninstallError::DependencyViolation(violations)) = result else {
        panic!("expected a dependency violation");
    };
    let blockers = violations.dependents_of("Vendor_Store").unwrap();
    assert_eq!(
        blockers["Vendor_Review"],
        vec!["Vendor_Review", "Vendor_Catalog", "Vendor_Store"]
    );
    assert!(transcript.contains("\n\tVendor_Catalog\n\tVendor_Review"));
}

#[test]
fn test_invalid_modules_are_reported_together() {
    let app = AppFixture::installed();

    let (result, transcript) = run(
        &app,
        &["Vendor_Local", "Vendor_Ghost", "Vendor_Store"],
        UninstallOptions::default(),
    );

    assert!(matches!(result, Err(UninstallError::InvalidModules(_))));
    assert_eq!(
        transcript,
        "Vendor_Local is not an installed composer package\nUnknown module(s): Vendor_Ghost\n"
    );
    assert_eq!(app.config_modules().len(), 5);
}

#[test]
fn test_not_installed_application_is_rejected() {
    let app = AppFixture::not_installed();

    let (result, transcript) = run(&app, &["Vendor_Store"], UninstallOptions::default());

    assert!(matches!(result, Err(UninstallError::ApplicationNotInstalled)));
    assert_eq!(
        transcript,
        "You cannot run this command because the application is not installed.\n"
    );
}

#[test]
fn test_module_without_registry_row_is_already_uninstalled() {
    let app = AppFixture::installed();

    let (result, transcript) = run(&app, &["Vendor_Admin"], UninstallOptions::default());
    let report = result.unwrap();

    assert_eq!(report.already_uninstalled, vec!["Vendor_Admin"]);
    assert!(transcript.contains("Vendor_Admin is already uninstalled\n"));
    assert!(!app
        .config_modules()
        .iter()
        .any(|(name, _)| name == "Vendor_Admin"));
    assert_eq!(app.registry_modules().len(), 4);
}

#[test]
fn test_not_installed_wins_over_broken_manifest() {
    let app = AppFixture::not_installed();
    app.write("app/code/Broken/Mod/module.toml", "this is = = not toml");

    let (result, transcript) = run(&app, &["Vendor_Store"], UninstallOptions::default());

    assert!(matches!(result, Err(UninstallError::ApplicationNotInstalled)));
    assert_eq!(
        transcript,
        "You cannot run this command because the application is not installed.\n"
    );
}

#[test]
fn test_broken_manifest_fails_installed_application_before_changes() {
    let app = AppFixture::installed();
    app.write("app/code/Broken/Mod/module.toml", "this is = = not toml");
    let config_before = app.read("app/etc/config.json");

    let (result, transcript) = run(&app, &["Vendor_Review"], UninstallOptions::default());

    assert!(matches!(result, Err(UninstallError::ConfigValidationError { .. })));
    assert!(transcript.is_empty());
    assert_eq!(app.read("app/etc/config.json"), config_before);
}

#[test]
fn test_repeated_uninstall_changes_nothing() {
    let app = AppFixture::installed();

    let (first, _) = run(&app, &["Vendor_Review"], UninstallOptions::default());
    first.unwrap();
    let config_after_first = app.read("app/etc/config.json");
    let registry_after_first = app.read("var/setup_module.json");

    let (second, transcript) = run(&app, &["Vendor_Review"], UninstallOptions::default());
    let report = second.unwrap();

    assert!(transcript.contains("Vendor_Review is already uninstalled\n"));
    assert_eq!(report.already_uninstalled, vec!["Vendor_Review"]);
    assert_eq!(app.read("app/etc/config.json"), config_after_first);
    assert_eq!(app.read("var/setup_module.json"), registry_after_first);
}
