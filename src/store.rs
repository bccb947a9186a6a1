//! Persisted key-value store and the preferences kept in it.
//!
//! Two keys are used: the layout choice and the ids of supplementary azkar
//! already marked as read. Missing or unreadable values mean "use default".

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const LAYOUT_KEY: &str = "zikrLayout";
pub const READ_AZKAR_KEY: &str = "readAzkar";

/// String key-value persistence.
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| anyhow!("store lock poisoned"))
}

/// In-process store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.values)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.values)?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`; a missing file is an empty store.
    ///
    /// An unparsable file is moved aside to `<name>.bak` and the store starts
    /// empty, so every preference reads as its default.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read store at {}", path.display()))?;
            match serde_json::from_str(&raw) {
                Ok(values) => values,
                Err(e) => {
                    let backup = sibling(&path, "bak");
                    tracing::warn!(
                        path = %path.display(),
                        backup = %backup.display(),
                        error = %e,
                        "Corrupt store, starting from defaults"
                    );
                    if let Err(e) = fs::rename(&path, &backup) {
                        tracing::warn!(error = %e, "Failed to move corrupt store aside");
                    }
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// `<data dir>/zikr-companion/store.json`, or `./store.json` without a data dir.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("zikr-companion"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("store.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(values).context("Failed to serialize store")?;

        // Write then rename so a crash never leaves a truncated store behind
        let tmp = sibling(&self.path, "tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write store at {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace store at {}", self.path.display()))
    }
}

/// `store.json` -> `store.json.<suffix>` in the same directory.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.values)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = lock(&self.values)?;
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }
}

/// Colour scheme choice, persisted as `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    Light = 1,
    #[default]
    Dark = 2,
}

impl Layout {
    pub fn from_stored(value: &str) -> Option<Self> {
        match value.trim().parse::<u8>().ok()? {
            1 => Some(Layout::Light),
            2 => Some(Layout::Dark),
            _ => None,
        }
    }

    pub fn stored_value(&self) -> u8 {
        *self as u8
    }

    pub fn toggled(&self) -> Self {
        match self {
            Layout::Light => Layout::Dark,
            Layout::Dark => Layout::Light,
        }
    }
}

/// Typed access to the persisted preferences.
#[derive(Debug)]
pub struct Preferences<S: Store> {
    store: S,
}

impl<S: Store> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn layout(&self) -> Result<Layout> {
        let stored = self.store.get(LAYOUT_KEY)?;
        Ok(stored
            .as_deref()
            .and_then(Layout::from_stored)
            .unwrap_or_default())
    }

    pub fn set_layout(&self, layout: Layout) -> Result<()> {
        self.store
            .set(LAYOUT_KEY, &layout.stored_value().to_string())
    }

    pub fn toggle_layout(&self) -> Result<Layout> {
        let layout = self.layout()?.toggled();
        self.set_layout(layout)?;
        Ok(layout)
    }

    /// Ids of supplementary azkar marked as read.
    pub fn read_azkar(&self) -> Result<BTreeSet<String>> {
        let stored = self.store.get(READ_AZKAR_KEY)?;
        Ok(stored
            .and_then(|raw| serde_json::from_str::<BTreeSet<String>>(&raw).ok())
            .unwrap_or_default())
    }

    pub fn set_read(&self, id: &str, read: bool) -> Result<()> {
        let mut ids = self.read_azkar()?;
        let changed = if read {
            ids.insert(id.to_string())
        } else {
            ids.remove(id)
        };
        if !changed {
            return Ok(());
        }

        let json = serde_json::to_string(&ids).context("Failed to serialize read markers")?;
        self.store.set(READ_AZKAR_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> Preferences<MemoryStore> {
        Preferences::new(MemoryStore::new())
    }

    // ==================== Layout Tests ====================

    #[test]
    fn test_layout_defaults_to_dark() {
        assert_eq!(prefs().layout().unwrap(), Layout::Dark);
    }

    #[test]
    fn test_layout_round_trip() {
        let prefs = prefs();
        prefs.set_layout(Layout::Light).unwrap();
        assert_eq!(prefs.layout().unwrap(), Layout::Light);
        assert_eq!(prefs.store.get(LAYOUT_KEY).unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_layout_garbage_falls_back_to_default() {
        let prefs = prefs();
        prefs.store.set(LAYOUT_KEY, "7").unwrap();
        assert_eq!(prefs.layout().unwrap(), Layout::Dark);
        prefs.store.set(LAYOUT_KEY, "wide").unwrap();
        assert_eq!(prefs.layout().unwrap(), Layout::Dark);
    }

    #[test]
    fn test_toggle_layout() {
        let prefs = prefs();
        assert_eq!(prefs.toggle_layout().unwrap(), Layout::Light);
        assert_eq!(prefs.toggle_layout().unwrap(), Layout::Dark);
    }

    // ==================== Read Marker Tests ====================

    #[test]
    fn test_read_azkar_defaults_to_empty() {
        assert!(prefs().read_azkar().unwrap().is_empty());
    }

    #[test]
    fn test_mark_and_unmark() {
        let prefs = prefs();
        prefs.set_read("morning-1", true).unwrap();
        prefs.set_read("evening-2", true).unwrap();
        prefs.set_read("morning-1", true).unwrap();

        let ids = prefs.read_azkar().unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("morning-1"));

        prefs.set_read("morning-1", false).unwrap();
        let ids = prefs.read_azkar().unwrap();
        assert!(!ids.contains("morning-1"));
        assert!(ids.contains("evening-2"));
    }

    #[test]
    fn test_read_azkar_stored_as_json_array() {
        let prefs = prefs();
        prefs.set_read("morning-2", true).unwrap();
        assert_eq!(
            prefs.store.get(READ_AZKAR_KEY).unwrap().as_deref(),
            Some(r#"["morning-2"]"#)
        );
    }

    #[test]
    fn test_read_azkar_garbage_is_empty() {
        let prefs = prefs();
        prefs.store.set(READ_AZKAR_KEY, "{not json").unwrap();
        assert!(prefs.read_azkar().unwrap().is_empty());
    }
}
