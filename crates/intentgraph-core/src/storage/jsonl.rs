//! JSONL export/import for git-friendly sync
//!
//! One record per line keeps diffs readable when a graph is checked into a
//! repository. Each entity kind gets its own file, written in insertion
//! order:
//!
//! ```text
//! <dir>/
//! ├── nodes.jsonl
//! ├── edges.jsonl
//! ├── hypothesis_paths.jsonl
//! ├── serendipity_traces.jsonl
//! ├── rd_curves.jsonl
//! └── _metadata.json
//! ```
//!
//! The audit trail is runtime-only and is not exported.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::graph::{GraphParts, ReferencePolicy, ResearchGraph};
use crate::domain::rate_distortion::RDCurve;
use crate::error::{Error, Result};

/// Metadata file name inside a sync directory
pub const METADATA_FILE: &str = "_metadata.json";

/// Entity kinds exported to JSONL, in import order
pub const EXPORTABLE_KINDS: &[&str] = &[
    "nodes",
    "edges",
    "hypothesis_paths",
    "serendipity_traces",
    "rd_curves",
];

/// Bumped when a record layout changes
pub const FORMAT_VERSION: u32 = 1;

/// One stored curve per line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdCurveRecord {
    pub intent: String,
    #[serde(flatten)]
    pub curve: RDCurve,
}

/// Contents of `_metadata.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncMetadata {
    pub graph_id: String,
    pub reference_policy: ReferencePolicy,
    pub exported_at: DateTime<Utc>,
    pub format_version: u32,
    /// Number of records per kind
    pub record_counts: BTreeMap<String, usize>,
    pub total_records: usize,
}

/// Result of an export operation
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub sync_dir: PathBuf,
    pub metadata: SyncMetadata,
    pub files_written: Vec<PathBuf>,
}

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub graph: ResearchGraph,
    /// Number of records imported per kind
    pub record_counts: BTreeMap<String, usize>,
    pub total_records: usize,
    /// Missing files and count mismatches
    pub warnings: Vec<String>,
}

/// Export every entity kind to `<dir>/<kind>.jsonl`
pub fn export_to_jsonl(graph: &ResearchGraph, dir: &Path) -> Result<ExportResult> {
    fs::create_dir_all(dir)?;

    let mut record_counts = BTreeMap::new();
    let mut files_written = Vec::new();

    for kind in EXPORTABLE_KINDS {
        let path = dir.join(format!("{}.jsonl", kind));
        let count = match *kind {
            "nodes" => write_records(&path, graph.nodes())?,
            "edges" => write_records(&path, graph.edges())?,
            "hypothesis_paths" => write_records(&path, graph.hypothesis_paths())?,
            "serendipity_traces" => write_records(&path, graph.traces())?,
            "rd_curves" => {
                let records: Vec<RdCurveRecord> = graph
                    .rd_curves()
                    .iter()
                    .map(|(intent, curve)| RdCurveRecord {
                        intent: intent.clone(),
                        curve: curve.clone(),
                    })
                    .collect();
                write_records(&path, &records)?
            }
            other => return Err(Error::Other(format!("Unknown entity kind: {}", other))),
        };
        record_counts.insert(kind.to_string(), count);
        files_written.push(path);
    }

    let metadata = SyncMetadata {
        graph_id: graph.id().to_string(),
        reference_policy: graph.policy(),
        exported_at: Utc::now(),
        format_version: FORMAT_VERSION,
        total_records: record_counts.values().sum(),
        record_counts,
    };

    let metadata_path = dir.join(METADATA_FILE);
    let mut writer = BufWriter::new(File::create(&metadata_path)?);
    serde_json::to_writer_pretty(&mut writer, &metadata)?;
    writer.flush()?;
    files_written.push(metadata_path);

    info!(
        dir = %dir.display(),
        total_records = metadata.total_records,
        "Exported graph to JSONL"
    );

    Ok(ExportResult {
        sync_dir: dir.to_path_buf(),
        metadata,
        files_written,
    })
}

/// Rebuild a graph from a directory written by [`export_to_jsonl`]
///
/// A missing kind file imports as empty with a warning. Malformed lines and
/// duplicate ids fail the whole import.
pub fn import_from_jsonl(dir: &Path) -> Result<ImportResult> {
    if !dir.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Sync directory not found: {}",
            dir.display()
        )));
    }

    let metadata: SyncMetadata =
        serde_json::from_reader(BufReader::new(File::open(dir.join(METADATA_FILE))?))?;
    if metadata.format_version > FORMAT_VERSION {
        return Err(Error::Parse(format!(
            "Unsupported sync format version {} (expected <= {})",
            metadata.format_version, FORMAT_VERSION
        )));
    }

    let mut warnings = Vec::new();
    let nodes = read_kind(dir, "nodes", &mut warnings)?;
    let edges = read_kind(dir, "edges", &mut warnings)?;
    let hypothesis_paths = read_kind(dir, "hypothesis_paths", &mut warnings)?;
    let traces = read_kind(dir, "serendipity_traces", &mut warnings)?;
    let curve_records: Vec<RdCurveRecord> = read_kind(dir, "rd_curves", &mut warnings)?;

    let mut rd_curves = BTreeMap::new();
    for record in curve_records {
        if rd_curves.insert(record.intent.clone(), record.curve).is_some() {
            return Err(Error::Parse(format!("duplicate rd curve intent '{}'", record.intent)));
        }
    }

    let mut record_counts = BTreeMap::new();
    record_counts.insert("nodes".to_string(), nodes.len());
    record_counts.insert("edges".to_string(), edges.len());
    record_counts.insert("hypothesis_paths".to_string(), hypothesis_paths.len());
    record_counts.insert("serendipity_traces".to_string(), traces.len());
    record_counts.insert("rd_curves".to_string(), rd_curves.len());

    for (kind, count) in &record_counts {
        let expected = metadata.record_counts.get(kind).copied().unwrap_or(0);
        if expected != *count {
            warnings.push(format!(
                "{}: metadata lists {} records, found {}",
                kind, expected, count
            ));
        }
    }
    for warning in &warnings {
        warn!("{}", warning);
    }

    let graph = ResearchGraph::from_parts(GraphParts {
        id: metadata.graph_id,
        policy: metadata.reference_policy,
        nodes,
        edges,
        hypothesis_paths,
        traces,
        rd_curves,
    })?;

    let total_records: usize = record_counts.values().sum();
    info!(dir = %dir.display(), total_records, "Imported graph from JSONL");

    Ok(ImportResult {
        graph,
        record_counts,
        total_records,
        warnings,
    })
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(records.len())
}

fn read_kind<T: DeserializeOwned>(
    dir: &Path,
    kind: &str,
    warnings: &mut Vec<String>,
) -> Result<Vec<T>> {
    let path = dir.join(format!("{}.jsonl", kind));
    if !path.exists() {
        warnings.push(format!("File not found: {}", path.display()));
        return Ok(Vec::new());
    }
    read_records(&path)
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|e| Error::Parse(format!("{}:{}: {}", path.display(), idx + 1, e)))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::{EdgeSpec, HypothesisType, ResearchDomain};

    fn sample() -> ResearchGraph {
        let mut graph = ResearchGraph::with_policy(ReferencePolicy::Permissive);
        let spike = graph.add_virology_node("Spike protein", "RBD binds ACE2", None);
        let mask = graph.add_public_health_node("Indoor masking", "Reduced spread", None);
        graph
            .add_correlative_edge(
                EdgeSpec::new(
                    &mask.id,
                    &spike.id,
                    "masking vs exposure",
                    mask.domain(),
                    spike.domain(),
                ),
                -0.6,
            )
            .unwrap();
        let trace = graph.create_trace("s", "q");
        graph
            .add_step(
                &trace,
                HypothesisType::PublicHealthImpact,
                "q",
                vec![ResearchDomain::PublicHealth],
                2,
                0.7,
            )
            .unwrap();
        graph.add_rd_curve("transmissibility", &[5, 10, 15], &[0.85, 0.7, 0.55]).unwrap();
        graph
    }

    #[test]
    fn test_export_writes_one_file_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let result = export_to_jsonl(&sample(), dir.path()).unwrap();

        assert_eq!(result.files_written.len(), EXPORTABLE_KINDS.len() + 1);
        assert_eq!(result.metadata.record_counts["nodes"], 2);
        assert_eq!(result.metadata.total_records, 5);

        let nodes = fs::read_to_string(dir.path().join("nodes.jsonl")).unwrap();
        assert_eq!(nodes.lines().count(), 2);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let graph = sample();
        export_to_jsonl(&graph, dir.path()).unwrap();

        let imported = import_from_jsonl(dir.path()).unwrap();
        assert!(imported.warnings.is_empty());
        assert_eq!(imported.total_records, 5);

        let loaded = imported.graph;
        assert_eq!(loaded.id(), graph.id());
        assert_eq!(loaded.policy(), ReferencePolicy::Permissive);
        assert_eq!(loaded.nodes(), graph.nodes());
        assert_eq!(loaded.edges(), graph.edges());
        assert_eq!(loaded.traces(), graph.traces());
        assert_eq!(loaded.rd_curves(), graph.rd_curves());
    }

    #[test]
    fn test_missing_kind_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        export_to_jsonl(&sample(), dir.path()).unwrap();
        fs::remove_file(dir.path().join("rd_curves.jsonl")).unwrap();

        let imported = import_from_jsonl(dir.path()).unwrap();
        assert!(imported.graph.rd_curves().is_empty());
        // missing file plus the count mismatch
        assert_eq!(imported.warnings.len(), 2);
    }

    #[test]
    fn test_duplicate_ids_fail() {
        let dir = tempfile::tempdir().unwrap();
        export_to_jsonl(&sample(), dir.path()).unwrap();

        let path = dir.path().join("nodes.jsonl");
        let contents = fs::read_to_string(&path).unwrap();
        let first = contents.lines().next().unwrap().to_string();
        fs::write(&path, format!("{}{}\n", contents, first)).unwrap();

        assert!(matches!(import_from_jsonl(dir.path()), Err(Error::Parse(_))));
    }

    #[test]
    fn test_malformed_line_reports_location() {
        let dir = tempfile::tempdir().unwrap();
        export_to_jsonl(&sample(), dir.path()).unwrap();
        fs::write(dir.path().join("edges.jsonl"), "not json\n").unwrap();

        let err = import_from_jsonl(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Parse(ref m) if m.contains("edges.jsonl:1")));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_from_jsonl(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
