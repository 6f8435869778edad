//! CLI integration tests for intentgraph
//!
//! Runs the intentgraph binary end-to-end using assert_cmd. Every test gets
//! its own working directory and config directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Temp working dir plus an isolated config dir
struct Workspace {
    dir: TempDir,
    config_dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    #[allow(deprecated)]
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("intentgraph").unwrap();
        cmd.current_dir(self.dir.path());
        cmd.env("INTENTGRAPH_CONFIG_DIR", self.config_dir.path());
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Run with `--format json` and parse stdout
    fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .args(["--format", "json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).unwrap()
    }
}

#[test]
fn test_help_lists_commands() {
    Workspace::new()
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("explore"))
        .stdout(predicate::str::contains("governance"));
}

#[test]
fn test_demo_creates_graph() {
    let ws = Workspace::new();

    ws.cmd()
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created example graph"))
        .stdout(predicate::str::contains("total_nodes: 5"));
    assert!(ws.dir.path().join("intentgraph.json").exists());

    let stats = ws.json(&["stats"]);
    assert_eq!(stats["total_edges"], 3);
    assert_eq!(stats["cross_domain_edges"], 3);
    assert_eq!(stats["domains_covered"], 5);
}

#[test]
fn test_init_refuses_overwrite_without_force() {
    let ws = Workspace::new();

    ws.cmd().arg("init").assert().success();
    ws.cmd()
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    ws.cmd().args(["init", "--force"]).assert().success();
}

#[test]
fn test_missing_graph_suggests_init() {
    Workspace::new()
        .cmd()
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("intentgraph init"));
}

#[test]
fn test_custom_graph_path() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["init", "--graph", "nested/custom.json", "--policy", "permissive"])
        .assert()
        .success();
    assert!(ws.dir.path().join("nested/custom.json").exists());

    let stats = ws.json(&["stats", "--graph", "nested/custom.json"]);
    assert_eq!(stats["total_nodes"], 0);
}

#[test]
fn test_add_nodes_and_edge() {
    let ws = Workspace::new();
    ws.cmd().arg("init").assert().success();

    let variant = ws.json(&[
        "node",
        "genomics",
        "--variant",
        "Omicron BA.5",
        "--mutations",
        "L452R,F486V",
    ]);
    let antibody = ws.json(&[
        "node",
        "immunology",
        "--topic",
        "Neutralizing antibodies",
        "--intent",
        "immune_escape",
    ]);
    assert_eq!(variant["type"], "genomics");
    assert_eq!(variant["data"]["mutations"][1], "F486V");
    assert_eq!(antibody["intent"], "immune_escape");

    let edge = ws.json(&[
        "edge",
        "correlative",
        "--source",
        variant["id"].as_str().unwrap(),
        "--target",
        antibody["id"].as_str().unwrap(),
        "--label",
        "escape",
        "--correlation=-0.6",
    ]);
    assert_eq!(edge["edge_type"], "Correlative");
    assert_eq!(edge["source_domain"], "Genomics");
    assert!((edge["weight"].as_f64().unwrap() - 0.6).abs() < 1e-6);

    let stats = ws.json(&["stats"]);
    assert_eq!(stats["total_nodes"], 2);
    assert_eq!(stats["cross_domain_edges"], 1);

    let paths = ws.json(&[
        "paths",
        "--from",
        variant["id"].as_str().unwrap(),
        "--to",
        antibody["id"].as_str().unwrap(),
    ]);
    assert_eq!(paths.as_array().unwrap().len(), 1);
    assert_eq!(paths[0][1], antibody["id"]);
}

#[test]
fn test_edge_to_unknown_node_fails_with_code() {
    let ws = Workspace::new();
    ws.cmd().arg("demo").assert().success();

    ws.cmd()
        .args([
            "edge",
            "causal",
            "--source",
            "missing-a",
            "--target",
            "missing-b",
            "--confidence",
            "0.9",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E001"));

    assert_eq!(ws.json(&["stats"])["total_edges"], 3);
}

#[test]
fn test_permissive_graph_accepts_forward_reference_edge() {
    let ws = Workspace::new();
    ws.cmd().args(["init", "--policy", "permissive"]).assert().success();

    ws.cmd()
        .args([
            "edge",
            "causal",
            "--source",
            "ghost-a",
            "--target",
            "ghost-b",
            "--confidence",
            "0.8",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--source-domain"));

    let edge = ws.json(&[
        "edge",
        "causal",
        "--source",
        "ghost-a",
        "--target",
        "ghost-b",
        "--source-domain",
        "genomics",
        "--target-domain",
        "virology",
        "--confidence",
        "0.8",
    ]);
    assert_eq!(edge["source_domain"], "Genomics");
    assert_eq!(edge["target_domain"], "Virology");

    let stats = ws.json(&["stats"]);
    assert_eq!(stats["total_edges"], 1);
    assert_eq!(stats["cross_domain_edges"], 1);
}

#[test]
fn test_strict_graph_rejects_forward_reference_edge() {
    let ws = Workspace::new();
    ws.cmd().arg("init").assert().success();

    ws.cmd()
        .args([
            "edge",
            "causal",
            "--source",
            "ghost-a",
            "--target",
            "ghost-b",
            "--source-domain",
            "genomics",
            "--target-domain",
            "virology",
            "--confidence",
            "0.8",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E100"));
    assert_eq!(ws.json(&["stats"])["total_edges"], 0);
}

#[test]
fn test_edge_confidence_out_of_range_is_rejected() {
    let ws = Workspace::new();
    ws.cmd().arg("init").assert().success();
    let a = ws.json(&["node", "virology", "--topic", "Spike"]);
    let b = ws.json(&["node", "treatment", "--therapy", "Paxlovid"]);

    ws.cmd()
        .args([
            "edge",
            "causal",
            "--source",
            a["id"].as_str().unwrap(),
            "--target",
            b["id"].as_str().unwrap(),
            "--confidence",
            "1.5",
        ])
        .assert()
        .failure();

    assert_eq!(ws.json(&["stats"])["total_edges"], 0);
}

#[test]
fn test_decompose_detects_intents() {
    Workspace::new()
        .cmd()
        .args([
            "decompose",
            "How does Omicron BA.5 affect vaccine efficacy and transmissibility?",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("vaccine_efficacy"))
        .stdout(predicate::str::contains("transmissibility"));
}

#[test]
fn test_query_demo_graph() {
    let ws = Workspace::new();
    ws.cmd().arg("demo").assert().success();

    let result = ws.json(&[
        "query",
        "Does BA.5 escape antibodies?",
        "--intent",
        "immune_escape",
        "--intent",
        "treatment_efficacy",
    ]);
    assert_eq!(result["intents"][0], "immune_escape");
    assert_eq!(result["intents"][1], "treatment_efficacy");
    assert_eq!(result["per_intent"].as_array().unwrap().len(), 2);
}

#[test]
fn test_explore_continues_latest_trace() {
    let ws = Workspace::new();
    ws.cmd().arg("init").assert().success();

    let first = ws.json(&[
        "explore",
        "--hypothesis",
        "Transmissibility",
        "--query",
        "BA.5 spread",
        "--domains",
        "virology",
    ]);
    let second = ws.json(&[
        "explore",
        "--hypothesis",
        "immune_escape",
        "--query",
        "BA.5 escape",
        "--domains",
        "immunology,genomics",
    ]);

    assert_eq!(first["step_number"], 1);
    assert_eq!(second["step_number"], 2);
    assert_eq!(first["trace_id"], second["trace_id"]);
    assert_eq!(second["cross_domain_jump"], true);

    let fresh = ws.json(&[
        "explore",
        "--hypothesis",
        "Transmissibility",
        "--query",
        "new thread",
        "--domains",
        "virology",
        "--new-trace",
    ]);
    assert_eq!(fresh["step_number"], 1);
    assert_eq!(ws.json(&["stats"])["serendipity_traces"], 2);
}

#[test]
fn test_explore_rejects_unknown_hypothesis() {
    let ws = Workspace::new();
    ws.cmd().arg("init").assert().success();

    ws.cmd()
        .args([
            "explore",
            "--hypothesis",
            "Virulence",
            "--query",
            "q",
            "--domains",
            "virology",
        ])
        .assert()
        .failure();
    assert_eq!(ws.json(&["stats"])["serendipity_traces"], 0);
}

#[test]
fn test_explore_with_corpus() {
    let ws = Workspace::new();
    ws.cmd().arg("init").assert().success();
    std::fs::write(
        ws.dir.path().join("corpus.jsonl"),
        concat!(
            r#"{"id":"d1","domain":"Genomics","text":"BA.5 carries L452R","source":"doi:a"}"#,
            "\n",
            r#"{"id":"d2","domain":"Virology","text":"BA.5 spike binding","source":"doi:b"}"#,
            "\n",
        ),
    )
    .unwrap();

    let outcome = ws.json(&[
        "explore",
        "--hypothesis",
        "Transmissibility",
        "--query",
        "BA.5",
        "--domains",
        "genomics",
        "--corpus",
        "corpus.jsonl",
    ]);
    assert_eq!(outcome["evidence_found"], 1);
}

#[test]
fn test_rd_records_curve() {
    let ws = Workspace::new();
    ws.cmd().arg("init").assert().success();

    ws.cmd()
        .args(["rd", "--intent", "transmissibility", "--batch-sizes", "5,10,15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Optimal batch size"));

    let analysis = ws.json(&[
        "rd",
        "--intent",
        "immune_escape",
        "--strategy",
        "max-curvature",
    ]);
    assert_eq!(analysis["strategy"], "max_curvature");
    assert_eq!(analysis["curve"]["points"].as_array().unwrap().len(), 5);
    assert_eq!(ws.json(&["stats"])["rd_curves"], 2);
}

#[test]
fn test_metrics_and_governance() {
    let ws = Workspace::new();
    ws.cmd().arg("init").assert().success();
    ws.cmd()
        .arg("governance")
        .assert()
        .success()
        .stdout(predicate::str::contains("BLOCKED"));

    ws.cmd().args(["demo", "--force"]).assert().success();
    let decision = ws.json(&["governance"]);
    assert_eq!(decision["allowed"], true);

    let metrics = ws.json(&["metrics"]);
    assert_eq!(metrics["domain_coverage"]["genomics"], 1);
}

#[test]
fn test_sync_round_trip() {
    let ws = Workspace::new();
    ws.cmd().arg("demo").assert().success();
    let before = ws.json(&["stats"]);

    ws.cmd()
        .args(["sync", "export", "--dir", "sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"));
    assert!(ws.dir.path().join("sync/_metadata.json").exists());

    ws.cmd()
        .args(["sync", "import", "--dir", "sync", "--graph", "copy.json"])
        .assert()
        .success();
    let after = ws.json(&["stats", "--graph", "copy.json"]);
    assert_eq!(before, after);
}

#[test]
fn test_config_set_and_get() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["config", "set", "retrieval.base_evidence", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set retrieval.base_evidence = 9"));
    ws.cmd()
        .args(["config", "get", "retrieval.base_evidence"])
        .assert()
        .success()
        .stdout(predicate::str::contains("9"));
    assert!(ws.config_dir.path().join("config.toml").exists());

    ws.cmd()
        .args(["config", "set", "session.max_confidence", "1.5"])
        .assert()
        .failure();
    ws.cmd()
        .args(["config", "get", "no.such_key"])
        .assert()
        .failure();
}

#[test]
fn test_config_changes_default_graph_path() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "set", "export.default_path", "research.json"])
        .assert()
        .success();

    ws.cmd().arg("init").assert().success();
    assert!(ws.dir.path().join("research.json").exists());
}
