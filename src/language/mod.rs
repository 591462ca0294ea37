// File-level language resolution
//
// - record: the persisted detection artifact and its text format
// - store: key -> record storage, sibling `<stem>lang.txt` files by default
// - vote: deterministic majority vote over per-window detections
// - resolver: cache lookup, detection pass and persistence

pub mod record;
pub mod resolver;
pub mod store;
pub mod vote;

pub use record::{ChunkDetection, LanguageDetectionRecord};
pub use resolver::LanguageResolver;
pub use store::{LanguageStore, MemoryLanguageStore, SiblingFileStore};
pub use vote::majority_language;
