#![allow(dead_code)]

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A small installed application:
///
/// - `Vendor_Store`: no dependencies
/// - `Vendor_Catalog`: depends on `Vendor_Store`, owns `var/import/catalog`
/// - `Vendor_Review`: depends on `Vendor_Catalog`
/// - `Vendor_Admin`: disabled, never installed in the registry
/// - `Vendor_Local`: enabled, but not a composer package
pub struct AppFixture {
    dir: TempDir,
}

impl AppFixture {
    pub fn installed() -> Self {
        let fixture = Self {
            dir: TempDir::new().unwrap(),
        };

        fixture.write(
            "composer.json",
            r#"{
                "name": "acme/shop",
                "require": {
                    "vendor/module-store": "^1.0",
                    "vendor/module-catalog": "^1.0",
                    "vendor/module-review": "^1.0",
                    "vendor/module-admin": "^1.0"
                }
            }"#,
        );
        fixture.write(
            "app/etc/config.json",
            r#"{
                "install": {"date": "Mon, 05 Jan 2026 10:00:00 +0000"},
                "db": {"host": "localhost"},
                "modules": {
                    "Vendor_Store": 1,
                    "Vendor_Catalog": 1,
                    "Vendor_Review": 1,
                    "Vendor_Admin": 0,
                    "Vendor_Local": 1
                }
            }"#,
        );
        fixture.write(
            "var/setup_module.json",
            r#"{
                "Vendor_Store": {"schema_version": "1.0.0", "data_version": "1.0.0"},
                "Vendor_Catalog": {"schema_version": "2.3.0", "data_version": "2.3.0"},
                "Vendor_Review": {"schema_version": "1.1.0", "data_version": "1.1.0"},
                "Vendor_Local": {"schema_version": "0.1.0"}
            }"#,
        );

        fixture.manifest(
            "Vendor/Store",
            "name = \"Vendor_Store\"\npackage = \"vendor/module-store\"\nversion = \"1.0.0\"\n",
        );
        fixture.manifest(
            "Vendor/Catalog",
            "name = \"Vendor_Catalog\"\npackage = \"vendor/module-catalog\"\nversion = \"2.3.0\"\n\
             sequence = [\"Vendor_Store\"]\ndata_paths = [\"var/import/catalog\"]\n",
        );
        fixture.manifest(
            "Vendor/Review",
            "name = \"Vendor_Review\"\npackage = \"vendor/module-review\"\nversion = \"1.1.0\"\n\
             sequence = [\"Vendor_Catalog\"]\n",
        );
        fixture.manifest(
            "Vendor/Admin",
            "name = \"Vendor_Admin\"\npackage = \"vendor/module-admin\"\n",
        );
        fixture.manifest("Vendor/Local", "name = \"Vendor_Local\"\n");

        fixture.write("var/import/catalog/products.csv", "sku,name\n");
        fixture.write("var/cache/mage--a/entry", "cached");
        fixture.write("var/page_cache/page", "cached");
        fixture.write("generated/code/Vendor/Catalog/Proxy.php", "<?php");
        fixture.write("pub/static/.htaccess", "Options -Indexes");
        fixture.write("pub/static/frontend/theme/styles.css", "body {}");
        fixture.write("index.php", "<?php");

        fixture
    }

    pub fn not_installed() -> Self {
        let fixture = Self::installed();
        fixture.write("app/etc/config.json", r#"{"install": {"date": ""}, "modules": {}}"#);
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn manifest(&self, module_dir: &str, content: &str) {
        self.write(&format!("app/code/{}/module.toml", module_dir), content);
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn json(&self, relative: &str) -> Value {
        serde_json::from_str(&self.read(relative)).unwrap()
    }

    /// `(module, flag)` pairs of the deployment configuration, in file order.
    pub fn config_modules(&self) -> Vec<(String, u64)> {
        self.json("app/etc/config.json")["modules"]
            .as_object()
            .unwrap()
            .iter()
            .map(|(name, flag)| (name.clone(), flag.as_u64().unwrap()))
            .collect()
    }

    pub fn registry_modules(&self) -> Vec<String> {
        self.json("var/setup_module.json")
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }

    pub fn entries(&self, relative: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path(relative))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
