//! Ballot receipts: which option this device chose, keyed by session id.
//!
//! Receipts outlive rounds on purpose. Nothing ever deletes them; an entry
//! for a rotated-away session simply never matches the live key again, which
//! is exactly how vote invalidation works. The key convention is
//! `voted-<session id>`, the scheme the browser clients use in localStorage.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::types::OptionId;

fn storage_key(session_id: &str) -> String {
    format!("voted-{session_id}")
}

pub trait ReceiptStore: Send + Sync {
    /// The option this device voted for in the given session, if any.
    fn get(&self, session_id: &str) -> Option<OptionId>;

    /// Record or overwrite this device's vote for the session. Best-effort:
    /// persistence failures are logged, never surfaced to the voter.
    fn set(&self, session_id: &str, option_id: &str);
}

#[derive(Default)]
pub struct MemoryReceipts {
    entries: Mutex<HashMap<String, OptionId>>,
}

impl MemoryReceipts {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReceiptStore for MemoryReceipts {
    fn get(&self, session_id: &str) -> Option<OptionId> {
        self.entries
            .lock()
            .unwrap()
            .get(&storage_key(session_id))
            .cloned()
    }

    fn set(&self, session_id: &str, option_id: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(storage_key(session_id), option_id.to_string());
    }
}

/// Write-through JSON file, for clients that need receipts to survive a
/// restart the way localStorage survives a page reload.
pub struct FileReceipts {
    path: PathBuf,
    entries: Mutex<HashMap<String, OptionId>>,
}

impl FileReceipts {
    /// Load existing receipts if the file is present and parseable; anything
    /// else starts empty with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(err) => {
                    tracing::warn!("unreadable receipt file {}: {}", path.display(), err);
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                tracing::warn!("failed to read receipt file {}: {}", path.display(), err);
                HashMap::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<String, OptionId>) {
        match serde_json::to_string(entries) {
            Ok(json) => {
                if let Err(err) = std::fs::write(&self.path, json) {
                    tracing::warn!("failed to persist receipts to {}: {}", self.path.display(), err);
                }
            }
            Err(err) => tracing::warn!("failed to serialize receipts: {}", err),
        }
    }
}

impl ReceiptStore for FileReceipts {
    fn get(&self, session_id: &str) -> Option<OptionId> {
        self.entries
            .lock()
            .unwrap()
            .get(&storage_key(session_id))
            .cloned()
    }

    fn set(&self, session_id: &str, option_id: &str) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(storage_key(session_id), option_id.to_string());
        self.persist(&entries);
    }
}
