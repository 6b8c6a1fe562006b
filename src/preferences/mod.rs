//! Durable user preferences
//!
//! Key-value store for presentation settings that should survive restarts.
//! Only the symbol display order is stored today. Every failure here is
//! non-fatal: reads fall back to defaults and writes are logged.

mod store;

pub use store::{FilePreferenceStore, MemoryPreferenceStore};

use std::path::PathBuf;
use thiserror::Error;

/// Key under which the display order is stored
pub const DISPLAY_ORDER_KEY: &str = "currencyOrder";

/// Preference store errors
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt preference data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persistence for string preferences
pub trait PreferenceStore: Send + Sync {
    /// Read a value, `None` when never written
    fn read(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    /// Write a value, replacing any previous one
    fn write(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Load the saved display order, empty when missing or unreadable
pub fn load_display_order(store: &dyn PreferenceStore) -> Vec<String> {
    let raw = match store.read(DISPLAY_ORDER_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read saved display order, using catalog order");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!(error = %e, "Saved display order is corrupt, using catalog order");
            Vec::new()
        }
    }
}

/// Persist the display order; failures are logged only
pub fn save_display_order(store: &dyn PreferenceStore, order: &[String]) {
    let result = serde_json::to_string(order)
        .map_err(PreferenceError::from)
        .and_then(|raw| store.write(DISPLAY_ORDER_KEY, &raw));

    if let Err(e) = result {
        tracing::warn!(error = %e, "Could not persist display order");
    }
}
