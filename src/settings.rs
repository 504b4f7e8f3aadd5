//! Typed preference store
//!
//! A flat, string-keyed namespace of preferences ("settings node"). Values are
//! stored as trimmed strings and converted on access, so the file stays
//! readable by other tooling. Reads never fail: a missing or unparsable value
//! yields the default supplied by the caller.
//!
//! File-backed nodes are persisted with `confy` under the platform config
//! directory, one file per node name.

use crate::constant::APP_NAME;
use crate::geometry::WindowGeometry;
use base64::Engine;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Confy(#[from] confy::ConfyError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// On-disk shape of a settings node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsNode {
    #[serde(default)]
    values: BTreeMap<String, String>,
}

enum Backend {
    Memory,
    File(PathBuf),
}

pub struct SettingsStore {
    name: String,
    backend: Backend,
    values: RwLock<BTreeMap<String, String>>,
    dirty: AtomicBool,
}

impl SettingsStore {
    /// Open the node `name` in the platform config directory, creating it if
    /// it doesn't exist.
    pub fn open(name: &str) -> Result<Self, SettingsError> {
        let path = confy::get_configuration_file_path(APP_NAME, Some(name))?;
        Ok(Self::open_path(name, path))
    }

    /// Open a node stored at an explicit path.
    ///
    /// A file that fails to load keeps the node file-backed: every entry
    /// that still parses on its own line is recovered, the rest read as
    /// defaults, and the next flush rewrites a valid file.
    pub fn open_path(name: &str, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let (values, dirty) = match confy::load_path::<SettingsNode>(&path) {
            Ok(node) => {
                info!("Load settings node '{}' from {:?}", name, path);
                (node.values, false)
            }
            Err(e) => {
                warn!("Settings node '{}' at {:?} is damaged: {}", name, path, e);
                let values = recover_entries(&path);
                info!("Recovered {} settings of node '{}'", values.len(), name);
                (values, true)
            }
        };
        Self {
            name: name.to_string(),
            backend: Backend::File(path),
            values: RwLock::new(values),
            dirty: AtomicBool::new(dirty),
        }
    }

    /// A node that lives only as long as the process.
    pub fn in_memory(name: &str) -> Self {
        Self {
            name: name.to_string(),
            backend: Backend::Memory,
            values: RwLock::new(BTreeMap::new()),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn node_name(&self) -> &str {
        &self.name
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    pub fn remove(&self, key: &str) {
        if self.values.write().remove(key).is_some() {
            self.dirty.store(true, Ordering::Release);
        }
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        self.values.read().get(key).map(|v| v.trim().to_string())
    }

    fn put_raw(&self, key: &str, value: &str) {
        self.values
            .write()
            .insert(key.to_string(), value.trim().to_string());
        self.dirty.store(true, Ordering::Release);
    }

    fn parse_or<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        match self.get_raw(key) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                debug!("Setting {} has unparsable value '{}'", key, raw);
                default
            }),
            None => default,
        }
    }

    // ------------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------------

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get_raw(key).unwrap_or_else(|| default.trim().to_string())
    }

    pub fn set_string(&self, key: &str, value: &str) {
        self.put_raw(key, value);
    }

    /// Only "true" / "false" (any case) are booleans; anything else is the default.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get_raw(key) {
            Some(raw) if raw.eq_ignore_ascii_case("true") => true,
            Some(raw) if raw.eq_ignore_ascii_case("false") => false,
            _ => default,
        }
    }

    pub fn set_bool(&self, key: &str, value: bool) {
        self.put_raw(key, if value { "true" } else { "false" });
    }

    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        self.parse_or(key, default)
    }

    pub fn set_int(&self, key: &str, value: i32) {
        self.put_raw(key, &value.to_string());
    }

    pub fn get_long(&self, key: &str, default: i64) -> i64 {
        self.parse_or(key, default)
    }

    pub fn set_long(&self, key: &str, value: i64) {
        self.put_raw(key, &value.to_string());
    }

    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        self.parse_or(key, default)
    }

    /// Store `value` with exactly `decimals` fraction digits, using `.` as the
    /// separator whatever the user's locale.
    pub fn set_float(&self, key: &str, value: f32, decimals: usize) {
        self.put_raw(key, &format!("{:.*}", decimals, value));
    }

    pub fn get_double(&self, key: &str, default: f64) -> f64 {
        self.parse_or(key, default)
    }

    /// Store `value` with exactly `decimals` fraction digits, using `.` as the
    /// separator whatever the user's locale.
    pub fn set_double(&self, key: &str, value: f64, decimals: usize) {
        self.put_raw(key, &format!("{:.*}", decimals, value));
    }

    /// Read `PREFIX_X`, `PREFIX_Y`, `PREFIX_WIDTH` and `PREFIX_HEIGHT`.
    /// Missing keys read as 0, which callers treat as "no stored geometry".
    pub fn get_rectangle(&self, prefix: &str) -> WindowGeometry {
        let prefix = prefix.to_uppercase();
        WindowGeometry {
            x: self.get_double(&format!("{}_X", prefix), 0.0),
            y: self.get_double(&format!("{}_Y", prefix), 0.0),
            width: self.get_double(&format!("{}_WIDTH", prefix), 0.0),
            height: self.get_double(&format!("{}_HEIGHT", prefix), 0.0),
        }
    }

    pub fn set_rectangle(&self, prefix: &str, rect: &WindowGeometry) {
        let prefix = prefix.to_uppercase();
        self.set_double(&format!("{}_X", prefix), rect.x, 2);
        self.set_double(&format!("{}_Y", prefix), rect.y, 2);
        self.set_double(&format!("{}_WIDTH", prefix), rect.width, 2);
        self.set_double(&format!("{}_HEIGHT", prefix), rect.height, 2);
    }

    /// Decode an object stored with [`SettingsStore::set_object`].
    /// The encoding is opaque and not guaranteed stable across versions.
    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key).filter(|raw| !raw.is_empty())?;
        match Self::decode_object(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Failed to decode object setting {}: {}", key, e);
                None
            }
        }
    }

    pub fn set_object<T: Serialize>(&self, key: &str, value: &T) -> Result<(), SettingsError> {
        let bytes = serde_json::to_vec(value)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.put_raw(key, &encoded);
        Ok(())
    }

    fn decode_object<T: DeserializeOwned>(raw: &str) -> Result<T, SettingsError> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(raw)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Write pending changes to the backing file. In-memory nodes only clear
    /// their dirty flag.
    pub fn flush(&self) -> Result<(), SettingsError> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        if let Backend::File(path) = &self.backend {
            let node = SettingsNode {
                values: self.values.read().clone(),
            };
            if let Err(e) = confy::store_path(path, &node) {
                self.dirty.store(true, Ordering::Release);
                return Err(e.into());
            }
            debug!("Save settings node '{}' to {:?}", self.name, path);
        }
        Ok(())
    }
}

impl Drop for SettingsStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            error!("Failed to save settings node '{}': {}", self.name, e);
        }
    }
}

/// Read `KEY = "value"` lines one at a time, skipping any that don't parse.
fn recover_entries(path: &Path) -> BTreeMap<String, String> {
    let Ok(text) = std::fs::read_to_string(path) else {
        return BTreeMap::new();
    };
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('[') && !line.starts_with('#'))
        .filter_map(|line| toml::from_str::<BTreeMap<String, String>>(line).ok())
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use uuid::Uuid;

    fn setup_test_dir() -> PathBuf {
        let test_dir = std::env::temp_dir().join(format!("test_settings_{}", Uuid::new_v4()));
        fs::create_dir_all(&test_dir).unwrap();
        test_dir
    }

    fn cleanup_test_dir(test_dir: &Path) {
        let _ = fs::remove_dir_all(test_dir);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Classroom {
        code: String,
        name: String,
    }

    #[test]
    fn test_string_values_are_trimmed() {
        let store = SettingsStore::in_memory("test");
        store.set_string("STRING_VALUE", "  Hello ");
        assert_eq!(store.get_string("STRING_VALUE", ""), "Hello");
        assert_eq!(store.get_string("MISSING", "fallback"), "fallback");
    }

    #[test]
    fn test_bool_values() {
        let store = SettingsStore::in_memory("test");
        store.set_bool("BOOLEAN_VALUE", true);
        assert!(store.get_bool("BOOLEAN_VALUE", false));

        store.set_string("BOOLEAN_VALUE", "TRUE");
        assert!(store.get_bool("BOOLEAN_VALUE", false));

        store.set_string("BOOLEAN_VALUE", "yes");
        assert!(store.get_bool("BOOLEAN_VALUE", true));
        assert!(!store.get_bool("BOOLEAN_VALUE", false));
    }

    #[test]
    fn test_integer_values() {
        let store = SettingsStore::in_memory("test");
        store.set_int("INT_VALUE", -10);
        store.set_long("LONG_VALUE", 20);
        assert_eq!(store.get_int("INT_VALUE", 0), -10);
        assert_eq!(store.get_long("LONG_VALUE", 0), 20);

        store.set_string("INT_VALUE", "ten");
        assert_eq!(store.get_int("INT_VALUE", 7), 7);
    }

    #[test]
    fn test_float_and_double_precision() {
        let store = SettingsStore::in_memory("test");

        store.set_float("FLOAT_VALUE", 0.714, 4);
        assert_eq!(store.get_string("FLOAT_VALUE", ""), "0.7140");
        assert_eq!(store.get_float("FLOAT_VALUE", 0.0), 0.714);

        store.set_double("DOUBLE_VALUE", std::f64::consts::PI, 4);
        assert_eq!(store.get_string("DOUBLE_VALUE", ""), "3.1416");
        assert_eq!(store.get_double("DOUBLE_VALUE", 0.0), 3.1416);

        store.set_double("WHOLE_VALUE", 12.5, 0);
        assert!(!store.get_string("WHOLE_VALUE", "").contains('.'));
        assert!(!store.get_string("DOUBLE_VALUE", "").contains(','));
    }

    #[test]
    fn test_rectangle_round_trip() {
        let store = SettingsStore::in_memory("test");
        store.set_rectangle("FOO", &WindowGeometry::new(10.0, 20.0, 300.0, 400.0));

        let rect = store.get_rectangle("FOO");
        assert_eq!(rect, WindowGeometry::new(10.0, 20.0, 300.0, 400.0));
        assert_eq!(store.get_string("FOO_WIDTH", ""), "300.00");
    }

    #[test]
    fn test_rectangle_prefix_is_uppercased() {
        let store = SettingsStore::in_memory("test");
        store.set_rectangle("main_view", &WindowGeometry::new(1.25, 2.5, 640.0, 480.0));
        assert!(store.contains("MAIN_VIEW_HEIGHT"));
        assert_eq!(
            store.get_rectangle("MAIN_VIEW"),
            WindowGeometry::new(1.25, 2.5, 640.0, 480.0)
        );
    }

    #[test]
    fn test_missing_rectangle_has_no_size() {
        let store = SettingsStore::in_memory("test");
        assert!(!store.get_rectangle("NOWHERE").has_size());
    }

    #[test]
    fn test_object_round_trip() {
        let store = SettingsStore::in_memory("test");
        let classroom = Classroom {
            code: "1i1".to_string(),
            name: "Informatique".to_string(),
        };
        store.set_object("OBJECT_VALUE", &classroom).unwrap();

        let loaded: Option<Classroom> = store.get_object("OBJECT_VALUE");
        assert_eq!(loaded, Some(classroom));
    }

    #[test]
    fn test_corrupt_object_reads_as_none() {
        let store = SettingsStore::in_memory("test");
        store.set_string("OBJECT_VALUE", "%%% not base64 %%%");
        assert_eq!(store.get_object::<Classroom>("OBJECT_VALUE"), None);
        assert_eq!(store.get_object::<Classroom>("MISSING"), None);
    }

    #[test]
    fn test_remove() {
        let store = SettingsStore::in_memory("test");
        store.set_int("INT_VALUE", 3);
        store.remove("INT_VALUE");
        assert!(!store.contains("INT_VALUE"));
        assert_eq!(store.get_int("INT_VALUE", 9), 9);
    }

    #[test]
    fn test_flush_and_reopen() {
        let test_dir = setup_test_dir();
        let path = test_dir.join("prefs.toml");

        {
            let store = SettingsStore::open_path("prefs", &path);
            assert_eq!(store.node_name(), "prefs");
            store.set_string("STRING_VALUE", "Hello");
            store.set_rectangle("MAIN_VIEW", &WindowGeometry::new(10.0, 20.0, 300.0, 400.0));
            store.flush().unwrap();
        }

        let reopened = SettingsStore::open_path("prefs", &path);
        assert_eq!(reopened.get_string("STRING_VALUE", ""), "Hello");
        assert_eq!(
            reopened.get_rectangle("MAIN_VIEW"),
            WindowGeometry::new(10.0, 20.0, 300.0, 400.0)
        );

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_damaged_file_keeps_valid_entries_and_is_rewritten() {
        let test_dir = setup_test_dir();
        let path = test_dir.join("prefs.toml");
        fs::write(
            &path,
            "[values]\nMAIN_VIEW_WIDTH = \"800.00\"\nBROKEN = = =\nBG_IMAGE_IDX = \"2\"\n",
        )
        .unwrap();

        {
            let store = SettingsStore::open_path("prefs", &path);
            assert_eq!(store.get_double("MAIN_VIEW_WIDTH", -1.0), 800.0);
            assert_eq!(store.get_int("BG_IMAGE_IDX", 0), 2);
            assert!(!store.contains("BROKEN"));
            assert_eq!(store.get_string("BROKEN", "default"), "default");
            store.flush().unwrap();
        }

        let written: SettingsNode = confy::load_path(&path).unwrap();
        assert_eq!(written.values.len(), 2);
        let reopened = SettingsStore::open_path("prefs", &path);
        assert_eq!(reopened.get_double("MAIN_VIEW_WIDTH", -1.0), 800.0);

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_unreadable_file_starts_empty_and_is_rewritten() {
        let test_dir = setup_test_dir();
        let path = test_dir.join("prefs.toml");
        fs::write(&path, "values = 3\n[[[").unwrap();

        {
            let store = SettingsStore::open_path("prefs", &path);
            assert_eq!(store.get_int("BG_IMAGE_IDX", 7), 7);
        }

        let written: SettingsNode = confy::load_path(&path).unwrap();
        assert!(written.values.is_empty());

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_drop_flushes_pending_changes() {
        let test_dir = setup_test_dir();
        let path = test_dir.join("prefs.toml");

        {
            let store = SettingsStore::open_path("prefs", &path);
            store.set_int("BG_IMAGE_IDX", 4);
        }

        let reopened = SettingsStore::open_path("prefs", &path);
        assert_eq!(reopened.get_int("BG_IMAGE_IDX", 0), 4);

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_concurrent_writes_to_independent_keys() {
        let store = std::sync::Arc::new(SettingsStore::in_memory("test"));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        store.set_int(&format!("KEY_{}_{}", i, j), j);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.get_int("KEY_3_49", 0), 49);
        assert_eq!(store.get_int("KEY_0_0", -1), 0);
    }
}
