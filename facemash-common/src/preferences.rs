//! Preference flags shared between screens
//!
//! Two flags survive across screens: "only with photo" and the class range
//! (junior/senior/all). They live in a small key/value store owned by the
//! host. Consumers never poll it: every store publishes a
//! [`watch`](tokio::sync::watch) channel of the decoded [`Preferences`] and
//! notifies only when the decoded value actually changes.
//!
//! Stored representation:
//!
//! | key             | values                    |
//! |-----------------|---------------------------|
//! | `onlyWithPhoto` | `"true"` or absent        |
//! | `selectedClass` | `"true"`, `"false"`, absent |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::write_toml_atomic;
use crate::{Error, Result};

/// Key of the "only with photo" flag
pub const KEY_ONLY_WITH_PHOTO: &str = "onlyWithPhoto";

/// Key of the class range flag
pub const KEY_SELECTED_CLASS: &str = "selectedClass";

/// Class grouping used to scope duos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassRange {
    /// No class filter
    #[default]
    All,
    /// Junior classes (`oldSchool=false`)
    Junior,
    /// Senior classes (`oldSchool=true`)
    Senior,
}

impl ClassRange {
    /// Value of the `oldSchool` query parameter, `None` = omit it
    pub fn old_school(&self) -> Option<bool> {
        match self {
            ClassRange::All => None,
            ClassRange::Junior => Some(false),
            ClassRange::Senior => Some(true),
        }
    }

    fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("true") => ClassRange::Senior,
            Some("false") => ClassRange::Junior,
            _ => ClassRange::All,
        }
    }

    fn to_stored(self) -> Option<&'static str> {
        match self {
            ClassRange::All => None,
            ClassRange::Junior => Some("false"),
            ClassRange::Senior => Some("true"),
        }
    }
}

/// Decoded preference flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub only_with_photo: bool,
    pub class_range: ClassRange,
}

impl Preferences {
    /// Decode from raw entries; unknown keys are ignored
    pub fn from_entries(entries: &BTreeMap<String, String>) -> Self {
        Self {
            only_with_photo: entries.get(KEY_ONLY_WITH_PHOTO).map(String::as_str) == Some("true"),
            class_range: ClassRange::from_stored(
                entries.get(KEY_SELECTED_CLASS).map(String::as_str),
            ),
        }
    }

    /// Write these flags into raw entries, removing keys that are unset
    pub fn apply_to(&self, entries: &mut BTreeMap<String, String>) {
        if self.only_with_photo {
            entries.insert(KEY_ONLY_WITH_PHOTO.to_string(), "true".to_string());
        } else {
            entries.remove(KEY_ONLY_WITH_PHOTO);
        }
        match self.class_range.to_stored() {
            Some(value) => {
                entries.insert(KEY_SELECTED_CLASS.to_string(), value.to_string());
            }
            None => {
                entries.remove(KEY_SELECTED_CLASS);
            }
        }
    }
}

/// Key/value preference collaborator with change notification
pub trait PreferenceStore: Send + Sync {
    /// Snapshot of all raw entries
    fn entries(&self) -> BTreeMap<String, String>;

    /// Replace all raw entries, notifying subscribers if the decoded flags changed
    fn replace_entries(&self, entries: BTreeMap<String, String>) -> Result<()>;

    /// Receiver that observes every change of the decoded flags
    fn subscribe(&self) -> watch::Receiver<Preferences>;

    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    /// Set (`Some`) or remove (`None`) a single key
    fn set(&self, key: &str, value: Option<&str>) -> Result<()> {
        let mut entries = self.entries();
        match value {
            Some(v) => {
                entries.insert(key.to_string(), v.to_string());
            }
            None => {
                entries.remove(key);
            }
        }
        self.replace_entries(entries)
    }

    fn preferences(&self) -> Preferences {
        Preferences::from_entries(&self.entries())
    }

    /// Store both flags in one update
    fn save(&self, preferences: &Preferences) -> Result<()> {
        let mut entries = self.entries();
        preferences.apply_to(&mut entries);
        self.replace_entries(entries)
    }
}

/// Entries plus the notification channel, shared by both store flavours
struct EntryCell {
    entries: Mutex<BTreeMap<String, String>>,
    tx: watch::Sender<Preferences>,
}

impl EntryCell {
    fn new(entries: BTreeMap<String, String>) -> Self {
        let (tx, _) = watch::channel(Preferences::from_entries(&entries));
        Self {
            entries: Mutex::new(entries),
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, entries: &BTreeMap<String, String>) {
        let decoded = Preferences::from_entries(entries);
        let changed = self.tx.send_if_modified(|current| {
            if *current != decoded {
                *current = decoded;
                true
            } else {
                false
            }
        });
        if changed {
            debug!(?decoded, "Preferences changed");
        }
    }
}

/// In-memory store, used by tests and hosts without persistence
pub struct MemoryPreferenceStore {
    cell: EntryCell,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::with_preferences(Preferences::default())
    }

    pub fn with_preferences(preferences: Preferences) -> Self {
        let mut entries = BTreeMap::new();
        preferences.apply_to(&mut entries);
        Self {
            cell: EntryCell::new(entries),
        }
    }
}

impl Default for MemoryPreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn entries(&self) -> BTreeMap<String, String> {
        self.cell.lock().clone()
    }

    fn replace_entries(&self, entries: BTreeMap<String, String>) -> Result<()> {
        let mut guard = self.cell.lock();
        *guard = entries;
        self.cell.publish(&guard);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.cell.tx.subscribe()
    }
}

/// TOML-file-backed store
///
/// The whole file is rewritten atomically on every change.
pub struct FilePreferenceStore {
    path: PathBuf,
    cell: EntryCell,
}

impl FilePreferenceStore {
    /// Open the store, starting empty if the file does not exist yet
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file exists but is not a flat table of strings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str::<BTreeMap<String, String>>(&content).map_err(|e| {
                Error::Config(format!("Invalid preference file {}: {}", path.display(), e))
            })?
        } else {
            BTreeMap::new()
        };

        info!(path = %path.display(), keys = entries.len(), "Opened preference store");
        Ok(Self {
            path,
            cell: EntryCell::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn entries(&self) -> BTreeMap<String, String> {
        self.cell.lock().clone()
    }

    fn replace_entries(&self, entries: BTreeMap<String, String>) -> Result<()> {
        let mut guard = self.cell.lock();
        write_toml_atomic(&entries, &self.path)?;
        *guard = entries;
        self.cell.publish(&guard);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.cell.tx.subscribe()
    }
}
