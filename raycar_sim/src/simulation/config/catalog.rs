// raycar_sim/src/simulation/config/catalog.rs

//! The prefab catalog: every `*.toml` under a root directory, keyed by its
//! dotted relative path (`vehicles/arcade_car.toml` -> `vehicles.arcade_car`).

use bevy::prelude::*;
use figment::{
    providers::{Format, Toml},
    value::Value,
    Figment,
};
use std::{collections::HashMap, path::Path};
use walkdir::WalkDir;

use super::ConfigError;

#[derive(Resource, Default, Debug, Clone)]
pub struct PrefabCatalog(pub HashMap<String, Value>);

impl PrefabCatalog {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted keys, for log output.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.0.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Walks `root` and parses every TOML file found. A missing root yields an
/// empty catalog; a file that fails to parse is an error.
pub fn load_catalog(root: &Path) -> Result<PrefabCatalog, ConfigError> {
    let mut catalog = PrefabCatalog::default();
    if !root.exists() {
        warn!(
            "Catalog directory not found at {:?}, no prefabs will be loaded.",
            root
        );
        return Ok(catalog);
    }

    info!("Loading prefab catalog from: {:?}", root);

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "toml")
        })
    {
        let path = entry.path();
        let Some(key) = catalog_key(root, path) else {
            continue;
        };

        let data = Figment::new()
            .merge(Toml::file(path))
            .extract::<Value>()
            .map_err(|source| ConfigError::CatalogItem {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Loaded catalog item: '{}'", key);
        catalog.0.insert(key, data);
    }

    Ok(catalog)
}

fn catalog_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("raycar_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("vehicles/variants")).expect("create scratch dir");
        dir
    }

    #[test]
    fn keys_follow_the_relative_path() {
        let root = Path::new("assets/catalog");
        let key = catalog_key(root, Path::new("assets/catalog/vehicles/arcade_car.toml"));
        assert_eq!(key.as_deref(), Some("vehicles.arcade_car"));
        assert_eq!(catalog_key(root, Path::new("elsewhere/x.toml")), None);
    }

    #[test]
    fn loads_nested_toml_files_only() {
        let root = scratch_dir("catalog_nested");
        fs::write(root.join("vehicles/a.toml"), "chassis_mass = 2.0\n").unwrap();
        fs::write(root.join("vehicles/variants/b.toml"), "from = \"vehicles.a\"\n").unwrap();
        fs::write(root.join("vehicles/readme.md"), "not a prefab").unwrap();

        let catalog = load_catalog(&root).unwrap();
        assert_eq!(catalog.keys(), vec!["vehicles.a", "vehicles.variants.b"]);
        let a = catalog.get("vehicles.a").and_then(|v| v.as_dict()).unwrap();
        assert_eq!(a.get("chassis_mass").and_then(|v| v.deserialize::<f64>().ok()), Some(2.0));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_root_is_an_empty_catalog() {
        let catalog = load_catalog(Path::new("definitely/not/here")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn malformed_item_is_reported_with_its_path() {
        let root = scratch_dir("catalog_malformed");
        fs::write(root.join("vehicles/broken.toml"), "chassis_mass = = 1").unwrap();

        match load_catalog(&root) {
            Err(ConfigError::CatalogItem { path, .. }) => assert!(path.ends_with("broken.toml")),
            other => panic!("unexpected result: {other:?}"),
        }

        fs::remove_dir_all(&root).ok();
    }
}
