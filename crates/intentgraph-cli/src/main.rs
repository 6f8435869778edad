//! Intentgraph CLI - typed multi-domain research graph

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use intentgraph_core::config::{Config, parse_batch_sizes};
use intentgraph_core::domain::graph::{
    EdgeSpec, GraphMetrics, HypothesisType, ReferencePolicy, ResearchDomain, ResearchGraph,
    check_merge_allowed,
};
use intentgraph_core::domain::query::{IntentDecomposer, MultiIntentQueryEngine};
use intentgraph_core::domain::rate_distortion::KneeStrategy;
use intentgraph_core::retrieval::{CorpusRetriever, EvidenceRetriever};
use intentgraph_core::session::ResearchSession;
use intentgraph_core::storage::{export_json, export_to_jsonl, import_from_jsonl, import_json};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "intentgraph")]
#[command(author, version, about = "Typed multi-domain research graph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Graph snapshot file (defaults to export.default_path)
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty graph
    Init {
        /// Reference policy (strict or permissive)
        #[arg(long)]
        policy: Option<String>,
        /// Overwrite an existing graph
        #[arg(long)]
        force: bool,
    },

    /// Create the SARS-CoV-2 example graph
    Demo {
        /// Overwrite an existing graph
        #[arg(long)]
        force: bool,
    },

    /// Add a node
    Node {
        #[command(subcommand)]
        kind: NodeKind,
    },

    /// Add an edge between two nodes
    Edge {
        #[command(subcommand)]
        kind: EdgeKind,
    },

    /// Record a hypothesis path
    Path {
        /// Hypothesis type (e.g. Transmissibility, immune_escape)
        #[arg(long = "type")]
        hypothesis_type: String,
        /// What the path claims
        #[arg(long)]
        description: String,
        /// Ordered node IDs, comma-separated
        #[arg(long, value_delimiter = ',')]
        nodes: Vec<String>,
        /// Ordered edge IDs, comma-separated
        #[arg(long, value_delimiter = ',')]
        edges: Vec<String>,
        #[arg(long)]
        confidence: f32,
        #[arg(long)]
        coverage: f32,
    },

    /// List node paths between two nodes
    Paths {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, default_value_t = 5)]
        max_depth: usize,
    },

    /// Show the research intents detected in a question
    Decompose { question: String },

    /// Query the graph across research intents
    Query {
        question: String,
        /// Intent to query (repeatable); decomposed from the question if omitted
        #[arg(short, long = "intent")]
        intents: Vec<String>,
    },

    /// Explore a hypothesis and record the step in a serendipity trace
    Explore {
        #[arg(long)]
        hypothesis: String,
        #[arg(long)]
        query: String,
        /// Domains explored, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        domains: Vec<String>,
        /// Session ID
        #[arg(long, default_value = "cli")]
        session: String,
        /// Continue this trace instead of the session's latest one
        #[arg(long)]
        trace: Option<String>,
        /// Start a new trace for this session
        #[arg(long, conflicts_with = "trace")]
        new_trace: bool,
        /// JSONL corpus to count evidence from (heuristic otherwise)
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// Compute a rate-distortion curve and its knee point
    Rd {
        #[arg(long)]
        intent: String,
        /// Batch sizes, comma-separated (defaults from config)
        #[arg(long)]
        batch_sizes: Option<String>,
        /// Knee strategy (min_combined or max_curvature)
        #[arg(long)]
        strategy: Option<String>,
    },

    /// Show graph statistics
    Stats,

    /// Show domain coverage metrics
    Metrics,

    /// Check evidence thresholds for merging
    Governance,

    /// Sync graph <-> JSONL directory
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum NodeKind {
    /// Viral biology fact
    Virology {
        #[arg(long)]
        topic: String,
        #[arg(long, default_value = "")]
        details: String,
        #[arg(long)]
        intent: Option<String>,
    },
    /// Immune response fact
    Immunology {
        #[arg(long)]
        topic: String,
        #[arg(long, default_value = "")]
        details: String,
        #[arg(long)]
        intent: Option<String>,
    },
    /// Variant and its mutations
    Genomics {
        #[arg(long)]
        variant: String,
        /// Mutations in order, comma-separated
        #[arg(long, value_delimiter = ',')]
        mutations: Vec<String>,
        #[arg(long)]
        intent: Option<String>,
    },
    /// Therapy and its mechanism
    Treatment {
        #[arg(long)]
        therapy: String,
        #[arg(long, default_value = "")]
        mechanism: String,
        #[arg(long)]
        intent: Option<String>,
    },
    /// Policy and its effect
    PublicHealth {
        #[arg(long)]
        policy: String,
        #[arg(long, default_value = "")]
        effect: String,
        #[arg(long)]
        intent: Option<String>,
    },
}

#[derive(Args)]
struct EdgeEnds {
    /// Source node ID
    #[arg(long)]
    source: String,
    /// Target node ID
    #[arg(long)]
    target: String,
    #[arg(long, default_value = "")]
    label: String,
    /// Evidence references, comma-separated
    #[arg(long, value_delimiter = ',')]
    evidence: Vec<String>,
    /// Source domain, required when the source node does not exist yet
    #[arg(long)]
    source_domain: Option<String>,
    /// Target domain, required when the target node does not exist yet
    #[arg(long)]
    target_domain: Option<String>,
}

#[derive(Subcommand)]
enum EdgeKind {
    /// Causal edge; weight equals confidence
    Causal {
        #[command(flatten)]
        ends: EdgeEnds,
        #[arg(long)]
        confidence: f32,
    },
    /// Correlative edge; weight is the absolute correlation
    Correlative {
        #[command(flatten)]
        ends: EdgeEnds,
        #[arg(long, allow_negative_numbers = true)]
        correlation: f32,
    },
}

#[derive(Subcommand)]
enum SyncAction {
    /// Export the graph to a JSONL directory
    Export {
        #[arg(long, default_value = "intentgraph-sync")]
        dir: PathBuf,
    },
    /// Replace the graph with the contents of a JSONL directory
    Import {
        #[arg(long, default_value = "intentgraph-sync")]
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Show config file path
    Path,
}

/// Settings shared by every command
struct Ctx {
    config: Config,
    graph_path: PathBuf,
    format: OutputFormat,
    quiet: bool,
}

impl Ctx {
    fn load_graph(&self) -> anyhow::Result<ResearchGraph> {
        if !self.graph_path.exists() {
            bail!(
                "No graph at {}. Run `intentgraph init` or `intentgraph demo` first.",
                self.graph_path.display()
            );
        }
        let graph = import_json(&self.graph_path)
            .with_context(|| format!("Failed to load graph: {}", self.graph_path.display()))?;
        debug!(path = %self.graph_path.display(), nodes = graph.nodes().len(), "Loaded graph");
        Ok(graph)
    }

    fn save_graph(&self, graph: &ResearchGraph) -> anyhow::Result<()> {
        export_json(graph, &self.graph_path)
            .with_context(|| format!("Failed to save graph: {}", self.graph_path.display()))?;
        Ok(())
    }

    /// Print `value` as JSON, or run `text` in text mode unless quiet
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text if !self.quiet => text(),
            OutputFormat::Text => {}
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing; logs go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("intentgraph=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = run(cli).await;

    if let Some(core) = result
        .as_ref()
        .err()
        .and_then(|err| err.downcast_ref::<intentgraph_core::Error>())
    {
        eprintln!("[{}] {}", core.code(), core);
        if let Some(hint) = core.suggestion() {
            eprintln!("Try: {}", hint);
        }
    }
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Config commands must work even when the stored config is invalid
    if let Commands::Config { action } = cli.command {
        return cmd_config(action, cli.format, cli.quiet);
    }

    let config = Config::load()?;
    let graph_path = cli
        .graph
        .unwrap_or_else(|| PathBuf::from(&config.export.default_path));
    let ctx = Ctx {
        config,
        graph_path,
        format: cli.format,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Init { policy, force } => cmd_init(&ctx, policy.as_deref(), force),
        Commands::Demo { force } => cmd_demo(&ctx, force),
        Commands::Node { kind } => cmd_node(&ctx, kind),
        Commands::Edge { kind } => cmd_edge(&ctx, kind),
        Commands::Path {
            hypothesis_type,
            description,
            nodes,
            edges,
            confidence,
            coverage,
        } => cmd_path(&ctx, &hypothesis_type, description, nodes, edges, confidence, coverage),
        Commands::Paths {
            from,
            to,
            max_depth,
        } => cmd_paths(&ctx, &from, &to, max_depth),
        Commands::Decompose { question } => cmd_decompose(&ctx, &question),
        Commands::Query { question, intents } => cmd_query(&ctx, &question, &intents),
        Commands::Explore {
            hypothesis,
            query,
            domains,
            session,
            trace,
            new_trace,
            corpus,
        } => {
            let target = match (trace, new_trace) {
                (Some(id), _) => TraceTarget::Resume(id),
                (None, true) => TraceTarget::New,
                (None, false) => TraceTarget::Latest,
            };
            cmd_explore(&ctx, &hypothesis, &query, &domains, &session, target, corpus.as_deref())
                .await
        }
        Commands::Rd {
            intent,
            batch_sizes,
            strategy,
        } => cmd_rd(&ctx, &intent, batch_sizes.as_deref(), strategy.as_deref()),
        Commands::Stats => cmd_stats(&ctx),
        Commands::Metrics => cmd_metrics(&ctx),
        Commands::Governance => cmd_governance(&ctx),
        Commands::Sync { action } => cmd_sync(&ctx, action),
        Commands::Config { .. } => unreachable!("handled above"),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

fn cmd_init(ctx: &Ctx, policy: Option<&str>, force: bool) -> anyhow::Result<()> {
    refuse_overwrite(&ctx.graph_path, force)?;

    let policy = match policy {
        Some(p) => ReferencePolicy::parse(p).ok_or_else(|| {
            anyhow!("Invalid reference policy: {}. Valid options: strict, permissive", p)
        })?,
        None => ctx.config.graph.reference_policy,
    };
    let graph = ResearchGraph::with_policy(policy);
    ctx.save_graph(&graph)?;
    info!(graph_id = %graph.id(), policy = %policy, "Initialized graph");

    ctx.emit(
        &json!({ "id": graph.id(), "path": ctx.graph_path, "reference_policy": policy }),
        || {
            println!("Initialized empty graph at {}", ctx.graph_path.display());
            println!("  Reference policy: {}", policy);
        },
    )
}

fn cmd_demo(ctx: &Ctx, force: bool) -> anyhow::Result<()> {
    refuse_overwrite(&ctx.graph_path, force)?;

    let graph = build_demo_graph(ctx.config.graph.reference_policy)?;
    ctx.save_graph(&graph)?;

    let stats = graph.get_statistics();
    ctx.emit(&stats, || {
        println!("Created example graph at {}", ctx.graph_path.display());
        print_stats(&stats);
    })
}

/// SARS-CoV-2 example: one node per domain, three edges, one path, one trace
fn build_demo_graph(policy: ReferencePolicy) -> intentgraph_core::Result<ResearchGraph> {
    let mut graph = ResearchGraph::with_policy(policy);

    let spike = graph.add_virology_node(
        "Spike protein S1/S2 structure",
        "RBD binds ACE2 receptor with high affinity",
        None,
    );
    let antibody = graph.add_immunology_node(
        "Neutralizing antibody response",
        "IgG antibodies target RBD and NTD regions",
        None,
    );
    let omicron = graph.add_variant_node(
        "Omicron BA.5",
        vec!["L452R".into(), "F486V".into(), "R493Q".into()],
        None,
    );
    let paxlovid = graph.add_treatment_node(
        "Paxlovid (nirmatrelvir/ritonavir)",
        "3CL protease inhibitor",
        None,
    );
    let masks = graph.add_public_health_node(
        "Indoor mask mandates",
        "Reduced transmission by 20-30% in controlled studies",
        None,
    );

    let escape = graph.add_causal_edge(
        EdgeSpec::new(
            &omicron.id,
            &antibody.id,
            "BA.5 mutations → immune escape",
            omicron.domain(),
            antibody.domain(),
        )
        .with_evidence(vec!["doi:10.1038/s41586-022-04980-y".into()]),
        0.85,
    )?;
    graph.add_correlative_edge(
        EdgeSpec::new(
            &paxlovid.id,
            &masks.id,
            "Paxlovid → reduced hospitalization",
            paxlovid.domain(),
            masks.domain(),
        )
        .with_evidence(vec!["doi:10.1056/NEJMoa2118542".into()]),
        0.89,
    )?;
    let binding = graph.add_causal_edge(
        EdgeSpec::new(
            &omicron.id,
            &spike.id,
            "Omicron BA.5 → increased transmissibility",
            omicron.domain(),
            spike.domain(),
        )
        .with_evidence(vec!["doi:10.1016/j.cell.2022.06.005".into()]),
        0.91,
    )?;

    graph.add_hypothesis_path(
        HypothesisType::Transmissibility,
        "BA.5 mutations increase transmissibility via enhanced ACE2 binding",
        vec![omicron.id.clone(), spike.id.clone()],
        vec![binding.id.clone()],
        0.91,
        0.88,
    )?;
    graph.add_hypothesis_path(
        HypothesisType::ImmuneEscape,
        "BA.5 mutations evade neutralizing antibodies",
        vec![omicron.id.clone(), antibody.id.clone()],
        vec![escape.id.clone()],
        0.85,
        0.8,
    )?;

    let trace = graph.create_trace(
        "session-001",
        "How does Omicron BA.5 affect vaccine efficacy and transmissibility?",
    );
    graph.add_step(
        &trace,
        HypothesisType::Transmissibility,
        "Omicron BA.5 transmissibility mutations",
        vec![ResearchDomain::Genomics, ResearchDomain::Virology],
        12,
        0.85,
    )?;
    graph.add_step(
        &trace,
        HypothesisType::VaccineEfficacy,
        "BA.5 spike mutations vaccine escape",
        vec![ResearchDomain::Immunology, ResearchDomain::Genomics],
        8,
        0.72,
    )?;

    graph.add_rd_curve("transmissibility", &[5, 10, 15, 20, 25], &[0.8, 0.5, 0.3, 0.2, 0.15])?;

    Ok(graph)
}

fn cmd_node(ctx: &Ctx, kind: NodeKind) -> anyhow::Result<()> {
    let mut graph = ctx.load_graph()?;

    let node = match kind {
        NodeKind::Virology {
            topic,
            details,
            intent,
        } => graph.add_virology_node(topic, details, intent.as_deref()),
        NodeKind::Immunology {
            topic,
            details,
            intent,
        } => graph.add_immunology_node(topic, details, intent.as_deref()),
        NodeKind::Genomics {
            variant,
            mutations,
            intent,
        } => graph.add_variant_node(variant, mutations, intent.as_deref()),
        NodeKind::Treatment {
            therapy,
            mechanism,
            intent,
        } => graph.add_treatment_node(therapy, mechanism, intent.as_deref()),
        NodeKind::PublicHealth {
            policy,
            effect,
            intent,
        } => graph.add_public_health_node(policy, effect, intent.as_deref()),
    };
    ctx.save_graph(&graph)?;

    ctx.emit(&node, || {
        println!("Added {} node: {}", node.domain(), node.id);
        println!("  Title:  {}", node.title());
        println!("  Intent: {}", node.intent);
    })
}

fn cmd_edge(ctx: &Ctx, kind: EdgeKind) -> anyhow::Result<()> {
    let mut graph = ctx.load_graph()?;

    let spec_for = |graph: &ResearchGraph, ends: EdgeEnds| -> anyhow::Result<EdgeSpec> {
        let source = endpoint_domain(graph, &ends.source, ends.source_domain.as_deref(), "source")?;
        let target = endpoint_domain(graph, &ends.target, ends.target_domain.as_deref(), "target")?;
        Ok(EdgeSpec::new(ends.source, ends.target, ends.label, source, target)
            .with_evidence(ends.evidence))
    };

    let edge = match kind {
        EdgeKind::Causal { ends, confidence } => {
            let spec = spec_for(&graph, ends)?;
            graph.add_causal_edge(spec, confidence)?
        }
        EdgeKind::Correlative { ends, correlation } => {
            let spec = spec_for(&graph, ends)?;
            graph.add_correlative_edge(spec, correlation)?
        }
    };
    ctx.save_graph(&graph)?;

    ctx.emit(&edge, || {
        println!("Added {} edge: {}", edge.edge_type, edge.id);
        println!(
            "  {} ({}) -> {} ({})",
            edge.source_id, edge.source_domain, edge.target_id, edge.target_domain
        );
        println!("  Weight: {:.2}", edge.weight);
    })
}

/// Domain of an edge endpoint: the flag when given, else the stored node's
///
/// A missing node without a flag is `NodeNotFound` under the strict policy.
fn endpoint_domain(
    graph: &ResearchGraph,
    id: &str,
    flag: Option<&str>,
    end: &str,
) -> anyhow::Result<ResearchDomain> {
    if let Some(raw) = flag {
        return parse_domain(raw);
    }
    match graph.get_node(id) {
        Some(node) => Ok(node.domain()),
        None if graph.policy() == ReferencePolicy::Permissive => bail!(
            "Node '{}' does not exist yet. Pass --{}-domain to add a forward reference.",
            id,
            end
        ),
        None => Err(intentgraph_core::Error::NodeNotFound(id.to_string()).into()),
    }
}

fn parse_domain(raw: &str) -> anyhow::Result<ResearchDomain> {
    ResearchDomain::parse(raw).ok_or_else(|| {
        anyhow!(
            "Unknown domain: {}. Valid options: virology, immunology, genomics, treatment, public_health",
            raw
        )
    })
}

fn cmd_path(
    ctx: &Ctx,
    hypothesis_type: &str,
    description: String,
    nodes: Vec<String>,
    edges: Vec<String>,
    confidence: f32,
    coverage: f32,
) -> anyhow::Result<()> {
    let hypothesis: HypothesisType = hypothesis_type.parse()?;
    let mut graph = ctx.load_graph()?;

    let path =
        graph.add_hypothesis_path(hypothesis, description, nodes, edges, confidence, coverage)?;
    ctx.save_graph(&graph)?;

    ctx.emit(&path, || {
        println!("Recorded {} hypothesis path: {}", path.hypothesis_type, path.id);
        println!("  Nodes: {}", path.node_sequence.len());
        println!("  Edges: {}", path.edge_sequence.len());
    })
}

fn cmd_paths(ctx: &Ctx, from: &str, to: &str, max_depth: usize) -> anyhow::Result<()> {
    let graph = ctx.load_graph()?;
    graph.require_node(from)?;
    graph.require_node(to)?;
    let paths = graph.find_paths(from, to, max_depth);

    ctx.emit(&paths, || {
        if paths.is_empty() {
            println!("No paths within depth {}", max_depth);
        }
        for path in &paths {
            let titles: Vec<&str> = path
                .iter()
                .filter_map(|id| graph.get_node(id).map(|n| n.title()))
                .collect();
            println!("{}", titles.join(" -> "));
        }
    })
}

fn cmd_decompose(ctx: &Ctx, question: &str) -> anyhow::Result<()> {
    let intents = IntentDecomposer::new().decompose(question);

    ctx.emit(&intents, || {
        for intent in &intents {
            println!("{} ({})", intent, intent.domain());
        }
    })
}

fn cmd_query(ctx: &Ctx, question: &str, intents: &[String]) -> anyhow::Result<()> {
    let graph = ctx.load_graph()?;
    let result = MultiIntentQueryEngine::new().query(&graph, question, Some(intents));

    ctx.emit(&result, || {
        println!("Question: {}", result.question);
        println!("Intents detected: {}", result.intents.join(", "));
        for slice in &result.per_intent {
            println!(
                "  {:<24} {:<12} nodes={} edges={}",
                slice.intent, slice.domain, slice.node_count, slice.edge_count
            );
        }
        println!("Evidence count: {}", result.evidence_count);
        println!("Confidence: {:.2}", result.confidence);
    })
}

enum TraceTarget {
    Resume(String),
    New,
    Latest,
}

async fn cmd_explore(
    ctx: &Ctx,
    hypothesis: &str,
    query: &str,
    domains: &[String],
    session_id: &str,
    target: TraceTarget,
    corpus: Option<&Path>,
) -> anyhow::Result<()> {
    let domains = domains
        .iter()
        .map(|d| parse_domain(d))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut graph = ctx.load_graph()?;
    let mut session =
        ResearchSession::new(session_id).with_confidence_model(ctx.config.confidence_model());

    match target {
        TraceTarget::Resume(id) => {
            if graph.trace(&id).is_none() {
                return Err(intentgraph_core::Error::TraceNotFound(id).into());
            }
            session = session.resume(id);
        }
        TraceTarget::Latest => {
            if let Some(trace) = graph.traces().iter().rev().find(|t| t.session_id == session_id) {
                session = session.resume(trace.id.clone());
            }
        }
        TraceTarget::New => {}
    }

    let retriever: Box<dyn EvidenceRetriever> = match corpus {
        Some(path) => Box::new(CorpusRetriever::load_jsonl(path)?),
        None => Box::new(ctx.config.retriever()),
    };

    let outcome = session
        .explore_hypothesis(&mut graph, retriever.as_ref(), hypothesis, query, &domains)
        .await?;
    ctx.save_graph(&graph)?;

    ctx.emit(&outcome, || {
        println!("Hypothesis: {}", outcome.hypothesis);
        println!("Trace: {} (step {})", outcome.trace_id, outcome.step_number);
        println!("Evidence found: {}", outcome.evidence_found);
        println!("Confidence: {:.2}", outcome.confidence);
        if outcome.cross_domain_jump {
            println!("Cross-domain jump detected");
        }
    })
}

fn cmd_rd(
    ctx: &Ctx,
    intent: &str,
    batch_sizes: Option<&str>,
    strategy: Option<&str>,
) -> anyhow::Result<()> {
    let sizes = match batch_sizes {
        Some(raw) => parse_batch_sizes(raw)?,
        None => ctx.config.rate_distortion.default_batch_sizes.clone(),
    };
    let mut analyzer = ctx.config.analyzer();
    if let Some(s) = strategy {
        let strategy = KneeStrategy::parse(s).ok_or_else(|| {
            anyhow!("Invalid knee strategy: {}. Valid options: min_combined, max_curvature", s)
        })?;
        analyzer = analyzer.with_strategy(strategy);
    }

    let mut graph = ctx.load_graph()?;
    let analysis = analyzer.compute_and_record(&mut graph, intent, &sizes)?;
    ctx.save_graph(&graph)?;

    ctx.emit(&analysis, || {
        println!("Intent: {}", analysis.intent);
        for (idx, point) in analysis.curve.points.iter().enumerate() {
            let marker = if idx == analysis.knee_index { "*" } else { " " };
            println!("  {} rate={:<6} distortion={:.2}", marker, point.rate, point.distortion);
        }
        println!("Optimal batch size: {}", analysis.knee.rate);
        println!("Distortion at knee: {:.2}", analysis.knee.distortion);
        println!("Recommendation: {}", analysis.recommendation);
    })
}

fn cmd_stats(ctx: &Ctx) -> anyhow::Result<()> {
    let graph = ctx.load_graph()?;
    let stats = graph.get_statistics();

    ctx.emit(&stats, || {
        println!("Graph Statistics:");
        print_stats(&stats);
    })
}

fn print_stats(stats: &intentgraph_core::domain::graph::GraphStatistics) {
    println!("  total_nodes: {}", stats.total_nodes);
    println!("  total_edges: {}", stats.total_edges);
    println!("  causal_edges: {}", stats.causal_edges);
    println!("  correlative_edges: {}", stats.correlative_edges);
    println!("  cross_domain_edges: {}", stats.cross_domain_edges);
    println!("  hypothesis_paths: {}", stats.hypothesis_paths);
    println!("  serendipity_traces: {}", stats.serendipity_traces);
    println!("  rd_curves: {}", stats.rd_curves);
    println!("  domains_covered: {}", stats.domains_covered);
    println!("  avg_trace_diversity: {:.3}", stats.avg_trace_diversity);
}

fn cmd_metrics(ctx: &Ctx) -> anyhow::Result<()> {
    let graph = ctx.load_graph()?;
    let metrics = GraphMetrics::compute(&graph);

    ctx.emit(&metrics, || {
        println!("Domain coverage:");
        for (domain, count) in metrics.domain_coverage.as_map() {
            println!("  {:<14} {}", domain, count);
        }
        println!("Evidence diversity: {:.3}", metrics.evidence_diversity);
        println!("Branching factor: {:.2}", metrics.branching_factor);
    })
}

fn cmd_governance(ctx: &Ctx) -> anyhow::Result<()> {
    let graph = ctx.load_graph()?;
    let decision = check_merge_allowed(&graph, &ctx.config.thresholds());

    ctx.emit(&decision, || {
        let status = if decision.allowed { "ALLOWED" } else { "BLOCKED" };
        println!("{}: {}", status, decision.reason);
    })
}

fn cmd_sync(ctx: &Ctx, action: SyncAction) -> anyhow::Result<()> {
    match action {
        SyncAction::Export { dir } => {
            let graph = ctx.load_graph()?;
            let result = export_to_jsonl(&graph, &dir)?;

            ctx.emit(&result.metadata, || {
                println!("Exported {} records to {}", result.metadata.total_records, dir.display());
                for (kind, count) in &result.metadata.record_counts {
                    println!("  {}: {}", kind, count);
                }
            })
        }
        SyncAction::Import { dir } => {
            let result = import_from_jsonl(&dir)?;
            ctx.save_graph(&result.graph)?;

            ctx.emit(
                &json!({
                    "record_counts": result.record_counts,
                    "total_records": result.total_records,
                    "warnings": result.warnings,
                }),
                || {
                    println!("Imported {} records from {}", result.total_records, dir.display());
                    for warning in &result.warnings {
                        println!("  Warning: {}", warning);
                    }
                },
            )
        }
    }
}

fn cmd_config(action: ConfigAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            match format {
                OutputFormat::Json => {
                    let map: serde_json::Map<String, serde_json::Value> = items
                        .into_iter()
                        .map(|(k, v)| (k, serde_json::Value::String(v)))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&map)?);
                }
                OutputFormat::Text => {
                    for (key, value) in items {
                        println!("{} = {}", key, value);
                    }
                }
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn refuse_overwrite(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("Graph already exists at {}. Use --force to overwrite.", path.display());
    }
    Ok(())
}
