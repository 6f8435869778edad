//! Intentgraph Core Integration Tests

use intentgraph_core::{
    Error, Result,
    domain::graph::{
        EdgeSpec, GraphMetrics, HypothesisType, ReferencePolicy, ResearchDomain, ResearchGraph,
        ResearchIntent, check_merge_allowed,
    },
    domain::query::{IntentDecomposer, MultiIntentQueryEngine},
    domain::rate_distortion::{KneeStrategy, RDPoint, RateDistortionAnalyzer, select_knee},
    retrieval::{CorpusDoc, CorpusRetriever, HeuristicRetriever},
    session::ResearchSession,
    storage::{export_json, export_to_jsonl, import_from_jsonl, import_json},
};

/// One node per domain, one causal and one correlative edge
fn build_reference_graph() -> Result<ResearchGraph> {
    let mut graph = ResearchGraph::new();

    let spike = graph.add_virology_node(
        "Spike protein RBD",
        "Receptor binding domain mediates ACE2 attachment",
        None,
    );
    let antibodies = graph.add_immunology_node(
        "Neutralizing antibody response",
        "IgG antibodies target RBD and NTD regions",
        None,
    );
    let ba5 = graph.add_variant_node(
        "Omicron BA.5",
        vec!["L452R".into(), "F486V".into(), "R493Q".into()],
        None,
    );
    graph.add_treatment_node("Paxlovid", "3CL protease inhibitor", None);
    let masks = graph.add_public_health_node(
        "Indoor mask mandates",
        "Reduced transmission in enclosed spaces",
        None,
    );

    graph.add_causal_edge(
        EdgeSpec::new(
            &ba5.id,
            &antibodies.id,
            "BA.5 mutations enable immune escape",
            ba5.domain(),
            antibodies.domain(),
        )
        .with_evidence(vec!["doi:10.1038/s41586-022-04980-y".into()]),
        0.85,
    )?;
    graph.add_correlative_edge(
        EdgeSpec::new(&masks.id, &spike.id, "Masking vs exposure", masks.domain(), spike.domain()),
        -0.72,
    )?;

    Ok(graph)
}

#[test]
fn test_end_to_end_statistics() {
    let graph = build_reference_graph().unwrap();
    let stats = graph.get_statistics();

    assert_eq!(stats.total_nodes, 5);
    assert_eq!(stats.total_edges, 2);
    assert_eq!(stats.causal_edges, 1);
    assert_eq!(stats.correlative_edges, 1);
    assert_eq!(stats.cross_domain_edges, 2);
    assert_eq!(stats.domains_covered, 5);
}

#[test]
fn test_edge_weight_invariants() {
    let graph = build_reference_graph().unwrap();
    for edge in graph.edges() {
        assert_eq!(edge.weight, edge.confidence);
    }
    assert!((graph.edges()[1].weight - 0.72).abs() < 1e-6);
}

#[test]
fn test_node_domains_match_variants() {
    let graph = build_reference_graph().unwrap();
    let domains: Vec<ResearchDomain> = graph.nodes().iter().map(|n| n.domain()).collect();
    assert_eq!(domains, ResearchDomain::all());
}

#[test]
fn test_rejected_mutation_leaves_store_unchanged() {
    let mut graph = build_reference_graph().unwrap();
    let before = graph.get_statistics();
    let node = graph.nodes()[0].clone();

    let err = graph
        .add_causal_edge(
            EdgeSpec::new(&node.id, "ghost", "dangling", node.domain(), ResearchDomain::Genomics),
            0.5,
        )
        .unwrap_err();

    assert!(err.is_rejected_mutation());
    assert_eq!(err.code(), "E100");
    assert_eq!(graph.get_statistics(), before);
    assert!(graph.events().iter().any(|e| e.is_rejection()));
}

#[test]
fn test_permissive_graph_allows_forward_references() {
    let mut graph = ResearchGraph::with_policy(ReferencePolicy::Permissive);
    graph
        .add_hypothesis_path(
            HypothesisType::Transmissibility,
            "drafted before nodes exist",
            vec!["n1".into(), "n2".into()],
            vec!["e1".into()],
            0.9,
            0.8,
        )
        .unwrap();
    assert_eq!(graph.get_statistics().hypothesis_paths, 1);
}

#[test]
fn test_decompose_is_deterministic() {
    let decomposer = IntentDecomposer::new();
    let question = "How does Omicron BA.5 affect vaccine efficacy and transmissibility?";

    assert_eq!(decomposer.decompose(question), decomposer.decompose(question));
    assert_eq!(decomposer.decompose("?"), vec![ResearchIntent::Transmissibility]);
}

#[test]
fn test_query_over_reference_graph() {
    let graph = build_reference_graph().unwrap();
    let result = MultiIntentQueryEngine::new().query(
        &graph,
        "Do BA.5 mutations escape antibody neutralization despite mask mandates?",
        None,
    );

    assert_eq!(result.intents, vec!["immune_escape", "transmission_reduction"]);
    assert_eq!(result.evidence_count, 2);
    assert_eq!(result.nodes.len(), 2);
    assert_eq!(result.edges.len(), 2);
}

#[test]
fn test_trace_jump_count() {
    let mut graph = ResearchGraph::new();
    let trace = graph.create_trace("session-001", "jumps");

    for domain in [ResearchDomain::Virology, ResearchDomain::Virology, ResearchDomain::Genomics] {
        graph
            .add_step(&trace, HypothesisType::Transmissibility, "q", vec![domain], 1, 0.5)
            .unwrap();
    }

    let trace = graph.trace(&trace).unwrap();
    let numbers: Vec<usize> = trace.steps.iter().map(|s| s.step_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(trace.cross_domain_jumps, 1);
    assert_eq!(trace.total_evidence, 3);
}

#[test]
fn test_knee_point_selection() {
    let points: Vec<RDPoint> = [5.0, 10.0, 15.0, 20.0, 25.0]
        .into_iter()
        .zip([0.8, 0.5, 0.3, 0.2, 0.15])
        .map(|(r, d)| RDPoint::new(r, d))
        .collect();

    let combined: Vec<f64> = points.iter().map(|p| p.combined()).collect();
    assert!((combined[4] - 25.15).abs() < 1e-9);
    assert_eq!(select_knee(&points, KneeStrategy::MinCombined), Some(0));
}

#[test]
fn test_rd_analysis_recorded_on_graph() {
    let mut graph = ResearchGraph::new();
    let analysis = RateDistortionAnalyzer::default()
        .compute_and_record(&mut graph, "transmissibility", &[5, 10, 15, 20, 25])
        .unwrap();

    assert_eq!(analysis.knee.rate, 5.0);
    assert_eq!(graph.get_statistics().rd_curves, 1);
}

#[tokio::test]
async fn test_exploration_session_with_corpus() {
    let mut graph = build_reference_graph().unwrap();
    let retriever = CorpusRetriever::new(vec![
        CorpusDoc::new(ResearchDomain::Genomics, "BA.5 L452R mutation analysis", "doi:a"),
        CorpusDoc::new(ResearchDomain::Immunology, "BA.5 escapes neutralizing sera", "doi:b"),
    ]);
    let mut session = ResearchSession::new("session-001");

    let first = session
        .explore_hypothesis(
            &mut graph,
            &retriever,
            "ImmuneEscape",
            "BA.5",
            &[ResearchDomain::Genomics],
        )
        .await
        .unwrap();
    let second = session
        .explore_hypothesis(
            &mut graph,
            &retriever,
            "VaccineEfficacy",
            "BA.5",
            &[ResearchDomain::Genomics, ResearchDomain::Immunology],
        )
        .await
        .unwrap();

    assert_eq!(first.evidence_found, 1);
    assert!((first.confidence - 0.65).abs() < 1e-6);
    assert_eq!(second.evidence_found, 2);
    assert!(second.cross_domain_jump);

    let summary = graph.traces()[0].summary();
    assert_eq!(summary.total_steps, 2);
    assert_eq!(summary.unique_hypotheses, 2);
}

#[tokio::test]
async fn test_unrecognized_hypothesis_fails() {
    let mut graph = ResearchGraph::new();
    let mut session = ResearchSession::new("s");
    let err = session
        .explore_hypothesis(&mut graph, &HeuristicRetriever::default(), "Virulence", "q", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnrecognizedHypothesis(_)));
}

#[test]
fn test_metrics_and_governance() {
    let graph = build_reference_graph().unwrap();
    let metrics = GraphMetrics::compute(&graph);
    assert_eq!(metrics.branching_factor, 1.0);

    let decision = check_merge_allowed(&graph, &Default::default());
    assert!(decision.allowed);
}

#[test]
fn test_json_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    let graph = build_reference_graph().unwrap();

    export_json(&graph, &path).unwrap();
    let loaded = import_json(&path).unwrap();

    assert_eq!(loaded.nodes(), graph.nodes());
    assert_eq!(loaded.edges(), graph.edges());
    assert_eq!(loaded.get_statistics(), graph.get_statistics());
}

#[test]
fn test_jsonl_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let graph = build_reference_graph().unwrap();

    export_to_jsonl(&graph, dir.path()).unwrap();
    let imported = import_from_jsonl(dir.path()).unwrap();

    assert_eq!(imported.graph.id(), graph.id());
    assert_eq!(imported.graph.nodes(), graph.nodes());
    assert_eq!(imported.graph.edges(), graph.edges());
    assert!(imported.warnings.is_empty());
}

#[test]
fn test_non_finite_redundancy_never_reaches_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    let mut graph = build_reference_graph().unwrap();

    let err = graph
        .add_rd_curve("transmissibility", &[5, 10], &[f64::NAN, 0.5])
        .unwrap_err();
    assert!(err.is_rejected_mutation());
    assert!(graph.rd_curves().is_empty());

    export_json(&graph, &path).unwrap();
    assert!(import_json(&path).is_ok());
}

#[test]
fn test_computed_curves_survive_json_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    let mut graph = ResearchGraph::new();
    let sizes: Vec<u32> = (1..=40).collect();

    RateDistortionAnalyzer::default()
        .compute_and_record(&mut graph, "transmissibility", &sizes)
        .unwrap();
    export_json(&graph, &path).unwrap();
    let loaded = import_json(&path).unwrap();

    assert_eq!(loaded.rd_curves(), graph.rd_curves());

    let jsonl_dir = dir.path().join("sync");
    export_to_jsonl(&graph, &jsonl_dir).unwrap();
    assert_eq!(import_from_jsonl(&jsonl_dir).unwrap().graph.rd_curves(), graph.rd_curves());
}

#[test]
fn test_policy_flipped_snapshot_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    let mut graph = ResearchGraph::with_policy(ReferencePolicy::Permissive);
    graph
        .add_causal_edge(
            EdgeSpec::new(
                "ghost-a",
                "ghost-b",
                "forward reference",
                ResearchDomain::Genomics,
                ResearchDomain::Virology,
            ),
            0.8,
        )
        .unwrap();
    export_json(&graph, &path).unwrap();
    assert_eq!(import_json(&path).unwrap().edges().len(), 1);

    let mut doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    doc["reference_policy"] = "strict".into();
    std::fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

    let err = import_json(&path).unwrap_err();
    assert!(matches!(err, Error::ReferentialIntegrity(_)));
}

#[test]
fn test_tampered_edge_weight_is_rejected_on_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    export_json(&build_reference_graph().unwrap(), &path).unwrap();

    let mut doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    doc["edges"][0]["weight"] = serde_json::json!(0.1);
    std::fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

    assert!(matches!(import_json(&path), Err(Error::InvalidInput(_))));
}
