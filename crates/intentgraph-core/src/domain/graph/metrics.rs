//! Domain coverage metrics over the node set

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::research::ResearchDomain;
use super::store::ResearchGraph;

/// Node counts per domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainCoverage {
    pub virology: usize,
    pub immunology: usize,
    pub genomics: usize,
    pub treatment: usize,
    pub public_health: usize,
}

impl DomainCoverage {
    pub fn count(&self, domain: ResearchDomain) -> usize {
        match domain {
            ResearchDomain::Virology => self.virology,
            ResearchDomain::Immunology => self.immunology,
            ResearchDomain::Genomics => self.genomics,
            ResearchDomain::Treatment => self.treatment,
            ResearchDomain::PublicHealth => self.public_health,
        }
    }

    fn increment(&mut self, domain: ResearchDomain) {
        let slot = match domain {
            ResearchDomain::Virology => &mut self.virology,
            ResearchDomain::Immunology => &mut self.immunology,
            ResearchDomain::Genomics => &mut self.genomics,
            ResearchDomain::Treatment => &mut self.treatment,
            ResearchDomain::PublicHealth => &mut self.public_health,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        ResearchDomain::all().iter().map(|d| self.count(*d)).sum()
    }

    /// Counts keyed by domain label
    pub fn as_map(&self) -> BTreeMap<ResearchDomain, usize> {
        ResearchDomain::all()
            .iter()
            .map(|d| (*d, self.count(*d)))
            .collect()
    }
}

/// How evenly the graph spans the research domains
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub domain_coverage: DomainCoverage,
    /// Shannon entropy (natural log) of the node domain distribution
    pub evidence_diversity: f64,
    /// Fraction of the five domains with at least one node
    pub branching_factor: f64,
}

impl GraphMetrics {
    pub fn compute(graph: &ResearchGraph) -> Self {
        let mut coverage = DomainCoverage::default();
        for node in graph.nodes() {
            coverage.increment(node.domain());
        }

        let total = coverage.total() as f64;
        let evidence_diversity = if total == 0.0 {
            0.0
        } else {
            ResearchDomain::all()
                .iter()
                .map(|d| coverage.count(*d) as f64 / total)
                .filter(|p| *p > 0.0)
                .map(|p| -p * p.ln())
                .sum()
        };

        let populated = ResearchDomain::all()
            .iter()
            .filter(|d| coverage.count(**d) > 0)
            .count();

        Self {
            domain_coverage: coverage,
            evidence_diversity,
            branching_factor: populated as f64 / ResearchDomain::all().len() as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph_metrics() {
        let metrics = GraphMetrics::compute(&ResearchGraph::new());
        assert_eq!(metrics, GraphMetrics::default());
    }

    #[test]
    fn test_metrics_with_two_domains() {
        let mut graph = ResearchGraph::new();
        graph.add_virology_node("Spike", "RBD", None);
        graph.add_variant_node("BA.5", vec!["L452R".into()], None);
        graph.add_variant_node("XBB.1.5", vec!["F486P".into()], None);
        graph.add_virology_node("Furin cleavage", "S1/S2", None);

        let metrics = GraphMetrics::compute(&graph);
        assert_eq!(metrics.domain_coverage.virology, 2);
        assert_eq!(metrics.domain_coverage.genomics, 2);
        assert_eq!(metrics.domain_coverage.total(), 4);
        assert!((metrics.evidence_diversity - std::f64::consts::LN_2).abs() < 1e-9);
        assert!((metrics.branching_factor - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_full_coverage_diversity_is_ln5() {
        let mut graph = ResearchGraph::new();
        graph.add_virology_node("a", "", None);
        graph.add_immunology_node("b", "", None);
        graph.add_variant_node("c", vec![], None);
        graph.add_treatment_node("d", "", None);
        graph.add_public_health_node("e", "", None);

        let metrics = GraphMetrics::compute(&graph);
        assert!((metrics.evidence_diversity - 5f64.ln()).abs() < 1e-9);
        assert_eq!(metrics.branching_factor, 1.0);
        assert_eq!(metrics.domain_coverage.as_map().len(), 5);
    }
}
