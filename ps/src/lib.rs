//! PresetStore - durable storage for presetcam overlay state
//!
//! Stores the two kinds of mutable user state that sit next to a preset
//! catalog: overlay records (modifications, deletions and user-authored
//! presets) and the per-preset selection history.
//!
//! Payloads are kept as raw JSON so the store stays independent of the preset
//! schema; decoding (and skipping undecodable records) is the caller's job.
//!
//! # Layout
//!
//! ```text
//! {store_dir}/
//! ├── overlay_records.jsonl   # one OverlayRecord per line
//! ├── overlay_records.lock    # fs2 advisory lock
//! ├── selection_history.json  # preset name -> recent selections
//! └── selection_history.lock
//! ```
//!
//! # Example
//!
//! ```ignore
//! use presetstore::{JsonlRecordStore, OverlayRecord, RecordStore};
//!
//! let mut store = JsonlRecordStore::open(".presetcam")?;
//! store.upsert(OverlayRecord::deletion("Watercolor"))?;
//! let records = store.load_all()?;
//! ```

mod error;
mod history;
mod offline;
mod record;
mod store;

pub use error::StoreError;
pub use history::{HistoryMap, HistoryStore, JsonHistoryStore, MemoryHistoryStore};
pub use offline::OfflineStore;
pub use record::{OverlayRecord, RecordKind};
pub use store::{JsonlRecordStore, MemoryRecordStore, RecordStore};

/// Current time as Unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
