use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::Device;
use crate::guide::scenarios;
use crate::guide::tree::DecisionTree;

pub const DEVICES_FILE: &str = "devices.json";
pub const TREES_FILE: &str = "decisionTrees.json";

/// Decision trees keyed by device id.
pub type TreeMap = BTreeMap<String, DecisionTree>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where devices and decision trees live between sessions.
///
/// Mutating calls return the full updated collection, so callers can
/// refresh their view without a second fetch.
pub trait Store {
    fn devices(&self) -> Result<Vec<Device>, StoreError>;

    fn trees(&self) -> Result<TreeMap, StoreError>;

    fn tree(&self, device_id: &str) -> Result<Option<DecisionTree>, StoreError> {
        Ok(self.trees()?.remove(device_id))
    }

    /// Insert a device, or replace the one with the same id.
    fn upsert_device(&mut self, device: Device) -> Result<Vec<Device>, StoreError>;

    fn delete_device(&mut self, device_id: &str) -> Result<Vec<Device>, StoreError>;

    /// Insert or replace the tree stored under `tree.device_id`.
    fn upsert_tree(&mut self, tree: DecisionTree) -> Result<TreeMap, StoreError>;

    fn delete_tree(&mut self, device_id: &str) -> Result<TreeMap, StoreError>;
}

// ---------------------------------------------------------------------------
// JSON files on disk
// ---------------------------------------------------------------------------

/// Keeps `devices.json` and `decisionTrees.json` in one directory. Every
/// call reads the file fresh and mutations write it back whole.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open the store in `dir`, creating the directory and seeding any
    /// missing file with the built-in devices and trees.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { dir: dir.into() };

        fs::create_dir_all(&store.dir).map_err(|source| StoreError::Io {
            path: store.dir.clone(),
            source,
        })?;

        if !store.path(DEVICES_FILE).exists() {
            warn!(
                "{} missing in {}, seeding built-in devices",
                DEVICES_FILE,
                store.dir.display()
            );
            store.write(DEVICES_FILE, &scenarios::devices())?;
        }
        if !store.path(TREES_FILE).exists() {
            warn!(
                "{} missing in {}, seeding built-in decision trees",
                TREES_FILE,
                store.dir.display()
            );
            store.write(TREES_FILE, &scenarios::decision_trees())?;
        }

        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<T, StoreError> {
        let path = self.path(file);
        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Read {} bytes from {}", content.len(), path.display());
        serde_json::from_str(&content).map_err(|source| StoreError::Json { path, source })
    }

    fn write<T: Serialize>(&self, file: &str, data: &T) -> Result<(), StoreError> {
        let path = self.path(file);
        let content = serde_json::to_string_pretty(data).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, content).map_err(|source| StoreError::Io { path, source })
    }
}

impl Store for JsonStore {
    fn devices(&self) -> Result<Vec<Device>, StoreError> {
        self.read(DEVICES_FILE)
    }

    fn trees(&self) -> Result<TreeMap, StoreError> {
        self.read(TREES_FILE)
    }

    fn upsert_device(&mut self, device: Device) -> Result<Vec<Device>, StoreError> {
        let mut devices = self.devices()?;
        match devices.iter_mut().find(|d| d.id == device.id) {
            Some(existing) => {
                info!("Updating device {}", device.id);
                *existing = device;
            }
            None => {
                info!("Adding device {}", device.id);
                devices.push(device);
            }
        }
        self.write(DEVICES_FILE, &devices)?;
        Ok(devices)
    }

    fn delete_device(&mut self, device_id: &str) -> Result<Vec<Device>, StoreError> {
        let mut devices = self.devices()?;
        devices.retain(|d| d.id != device_id);
        self.write(DEVICES_FILE, &devices)?;
        info!("Deleted device {device_id}");
        Ok(devices)
    }

    fn upsert_tree(&mut self, tree: DecisionTree) -> Result<TreeMap, StoreError> {
        let mut trees = self.trees()?;
        info!("Saving decision tree for {}", tree.device_id);
        trees.insert(tree.device_id.clone(), tree);
        self.write(TREES_FILE, &trees)?;
        Ok(trees)
    }

    fn delete_tree(&mut self, device_id: &str) -> Result<TreeMap, StoreError> {
        let mut trees = self.trees()?;
        trees.remove(device_id);
        self.write(TREES_FILE, &trees)?;
        info!("Deleted decision tree for {device_id}");
        Ok(trees)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::catalog::{delete_device_cascade, DeviceDraft};
    use crate::guide::import::import_tree;

    fn open_temp() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path().join("data")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_seeds_builtin_data() {
        let (_dir, store) = open_temp();

        assert!(store.dir().join(DEVICES_FILE).exists());
        assert_eq!(store.devices().unwrap(), scenarios::devices());
        assert_eq!(store.trees().unwrap(), scenarios::decision_trees());
        assert_eq!(
            store.tree("hair-dryer-pro-2024").unwrap(),
            Some(scenarios::hair_dryer_pro_scenario())
        );
        assert_eq!(store.tree("curling-iron-deluxe").unwrap(), None);
    }

    #[test]
    fn test_open_keeps_existing_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEVICES_FILE), "[]").unwrap();
        fs::write(dir.path().join(TREES_FILE), "{}").unwrap();

        let store = JsonStore::open(dir.path()).unwrap();
        assert!(store.devices().unwrap().is_empty());
        assert!(store.trees().unwrap().is_empty());
    }

    #[test]
    fn test_files_are_camel_case_json() {
        let (_dir, store) = open_temp();
        let raw = fs::read_to_string(store.dir().join(TREES_FILE)).unwrap();
        assert!(raw.contains("\"rootNodeId\": \"initial-problem\""));
        assert!(raw.contains("\n  \"hair-dryer-pro-2024\""));
    }

    #[test]
    fn test_upsert_device_adds_then_replaces() {
        let (_dir, mut store) = open_temp();
        let before = store.devices().unwrap().len();

        let mut device = DeviceDraft {
            id: "travel-dryer".into(),
            name: "Travel Dryer".into(),
            model: "TD-1".into(),
            core_device: "Hair Dryer".into(),
            brand_name: "Armani".into(),
            image_url: String::new(),
        }
        .into_device()
        .unwrap();

        let devices = store.upsert_device(device.clone()).unwrap();
        assert_eq!(devices.len(), before + 1);
        assert_eq!(devices.last(), Some(&device));

        device.model = "TD-2".into();
        let devices = store.upsert_device(device.clone()).unwrap();
        assert_eq!(devices.len(), before + 1);
        assert_eq!(store.devices().unwrap().last().unwrap().model, "TD-2");
    }

    #[test]
    fn test_upsert_and_delete_tree() {
        let (_dir, mut store) = open_temp();
        let json = r#"{"rootNodeId": "a", "nodes": {"a": {"id": "a", "question": "Lit?", "options": []}}}"#;
        let tree = import_tree("curling-iron-deluxe", json).unwrap();

        let trees = store.upsert_tree(tree.clone()).unwrap();
        assert_eq!(trees.get("curling-iron-deluxe"), Some(&tree));
        assert_eq!(store.tree("curling-iron-deluxe").unwrap(), Some(tree));

        let trees = store.delete_tree("curling-iron-deluxe").unwrap();
        assert!(!trees.contains_key("curling-iron-deluxe"));
        assert_eq!(trees.len(), 2);
    }

    #[test]
    fn test_tree_file_is_stable_across_writes() {
        let (_dir, mut store) = open_temp();
        let path = store.dir().join(TREES_FILE);
        let tree = scenarios::hair_dryer_pro_scenario();

        store.upsert_tree(tree.clone()).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        store.upsert_tree(tree).unwrap();
        let second = fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);

        // Node keys are written in id order.
        let cord = first.find("\"check-cord-damage\": {").unwrap();
        let initial = first.find("\"initial-problem\": {").unwrap();
        let outlet = first.find("\"test-outlet\": {").unwrap();
        assert!(cord < initial && initial < outlet);
    }

    #[test]
    fn test_delete_missing_entries_is_harmless() {
        let (_dir, mut store) = open_temp();
        let devices = store.delete_device("no-such-device").unwrap();
        assert_eq!(devices.len(), scenarios::devices().len());
        let trees = store.delete_tree("no-such-device").unwrap();
        assert_eq!(trees.len(), 2);
    }

    #[test]
    fn test_cascade_delete_removes_device_and_tree() {
        let (_dir, mut store) = open_temp();
        delete_device_cascade(&mut store, "hair-dryer-pro-2024").unwrap();

        assert!(store
            .devices()
            .unwrap()
            .iter()
            .all(|d| d.id != "hair-dryer-pro-2024"));
        assert_eq!(store.tree("hair-dryer-pro-2024").unwrap(), None);
        assert!(store.tree("straightener-elite-x1").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_file_reports_path() {
        let (_dir, store) = open_temp();
        fs::write(store.dir().join(DEVICES_FILE), "{oops").unwrap();

        let err = store.devices().unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
        assert!(err.to_string().contains(DEVICES_FILE));
    }
}
