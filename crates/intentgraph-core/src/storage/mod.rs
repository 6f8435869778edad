//! Storage layer
//!
//! Graphs live in memory; these modules move them to and from disk.
//!
//! - `snapshot`: one JSON document per graph
//! - `jsonl`: one JSONL file per entity kind, for git-friendly sync

pub mod jsonl;
pub mod snapshot;

pub use jsonl::{ExportResult, ImportResult, SyncMetadata, export_to_jsonl, import_from_jsonl};
pub use snapshot::{GraphSnapshot, export_json, import_json};
