use std::path::Path;

use batchsync_core::{HistoryItem, TranslationHistory};
use batchsync_engine::HistoryStore;
use serde::{Deserialize, Serialize};
use sync_logging::{sync_error, sync_info, sync_warn};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedHistory {
    items: Vec<HistoryItem>,
}

/// Loads single-image history; unreadable state yields an empty history.
pub(crate) fn load_history(state_dir: &Path) -> TranslationHistory {
    let store = HistoryStore::new(state_dir);
    let content = match store.load() {
        Ok(Some(text)) => text,
        Ok(None) => return TranslationHistory::new(),
        Err(err) => {
            sync_warn!("Failed to read history from {:?}: {}", state_dir, err);
            return TranslationHistory::new();
        }
    };

    match ron::from_str::<PersistedHistory>(&content) {
        Ok(state) => {
            sync_info!("Loaded {} history items from {:?}", state.items.len(), state_dir);
            TranslationHistory::from_items(state.items)
        }
        Err(err) => {
            sync_warn!("Failed to parse history from {:?}: {}", state_dir, err);
            TranslationHistory::new()
        }
    }
}

pub(crate) fn save_history(state_dir: &Path, history: &TranslationHistory) {
    let state = PersistedHistory {
        items: history.items().cloned().collect(),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(text) => text,
        Err(err) => {
            sync_error!("Failed to serialize history: {}", err);
            return;
        }
    };

    if let Err(err) = HistoryStore::new(state_dir).save(&content) {
        sync_error!("Failed to write history to {:?}: {}", state_dir, err);
    }
}
