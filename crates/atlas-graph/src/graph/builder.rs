//! Graph builders - dataset (+ filters) to node/edge sets
//!
//! Both builders are pure: identical inputs produce identical ids, labels,
//! parents, orphan flags and edges. Every entity in the relevant domain gets
//! a node, linked or not, so gaps stay visible.

use super::types::{EdgeKind, Graph, GraphEdge, GraphNode, NodeKind};
use atlas_types::{Dataset, DiagramKind, FilterSet};
use std::collections::{BTreeMap, BTreeSet, HashSet};

// =============================================================================
// NODE IDS
// =============================================================================

pub fn doc_provider_id(provider_id: &str) -> String {
    format!("provider:{}", provider_id)
}

pub fn doc_model_id(model_id: &str) -> String {
    format!("model:{}", model_id)
}

pub fn doc_evidence_id(evidence_id: &str) -> String {
    format!("evidence:{}", evidence_id)
}

pub fn chart_provider_id(provider_id: &str) -> String {
    format!("provider-{}", provider_id)
}

pub fn chart_category_id(category_id: &str) -> String {
    format!("category-{}", category_id)
}

pub fn chart_technique_id(category_id: &str, technique_id: &str) -> String {
    format!("technique-{}-{}", category_id, technique_id)
}

// =============================================================================
// DOCUMENTATION MAP
// =============================================================================

/// Build the provider -> model <- evidence graph
///
/// - `owns` edges run provider -> model
/// - `documents` edges run evidence -> model
/// - a model nobody documents, and evidence with no model or technique
///   links, are flagged `is_orphan`
pub fn build_documentation_map(dataset: &Dataset) -> Graph {
    let mut graph = Graph::new(DiagramKind::DocumentationMap);

    let provider_ids: HashSet<&str> = dataset.providers.iter().map(|p| p.id.as_str()).collect();
    let model_ids: HashSet<&str> = dataset.models.iter().map(|m| m.id.as_str()).collect();
    let documented: HashSet<&str> = dataset
        .evidence
        .iter()
        .flat_map(|e| e.model_ids.iter().map(String::as_str))
        .collect();

    for provider in &dataset.providers {
        graph.add_node(GraphNode::new(
            doc_provider_id(&provider.id),
            NodeKind::Provider,
            &provider.name,
        ));
    }

    for model in &dataset.models {
        let mut node = GraphNode::new(doc_model_id(&model.id), NodeKind::Model, &model.name)
            .with_orphan(!documented.contains(model.id.as_str()));

        if provider_ids.contains(model.provider_id.as_str()) {
            node = node.with_parent(doc_provider_id(&model.provider_id));
            graph.add_edge(GraphEdge::new(
                doc_provider_id(&model.provider_id),
                doc_model_id(&model.id),
                EdgeKind::Owns,
            ));
        } else {
            tracing::warn!(
                "Model {} references unknown provider {}",
                model.id,
                model.provider_id
            );
        }
        graph.add_node(node);
    }

    for evidence in &dataset.evidence {
        let is_orphan = evidence.model_ids.is_empty() && evidence.technique_ids.is_empty();
        let mut node = GraphNode::new(
            doc_evidence_id(&evidence.id),
            NodeKind::Evidence,
            &evidence.title,
        )
        .with_orphan(is_orphan);

        if provider_ids.contains(evidence.provider_id.as_str()) {
            node = node.with_parent(doc_provider_id(&evidence.provider_id));
        }
        graph.add_node(node);

        for model_id in &evidence.model_ids {
            if model_ids.contains(model_id.as_str()) {
                graph.add_edge(GraphEdge::new(
                    doc_evidence_id(&evidence.id),
                    doc_model_id(model_id),
                    EdgeKind::Documents,
                ));
            } else {
                tracing::warn!("Evidence {} references unknown model {}", evidence.id, model_id);
            }
        }
    }

    tracing::debug!(
        "Documentation map built: {} nodes, {} edges",
        graph.len(),
        graph.edges().len()
    );
    graph
}

// =============================================================================
// UNIFIED CHART
// =============================================================================

/// Build the provider / category / technique graph
///
/// Category and technique nodes come from the full catalog regardless of
/// filters, so the column layout stays stable as filters change. Filters
/// decide which provider nodes appear and which provider -> technique edges
/// exist.
pub fn build_unified_chart(dataset: &Dataset, filters: &FilterSet) -> Graph {
    let mut graph = Graph::new(DiagramKind::UnifiedChart);

    let category_ids: HashSet<&str> = dataset.categories.iter().map(|c| c.id.as_str()).collect();

    for category in &dataset.categories {
        graph.add_node(GraphNode::new(
            chart_category_id(&category.id),
            NodeKind::Category,
            &category.name,
        ));
    }

    for technique in &dataset.techniques {
        let node_id = chart_technique_id(&technique.category_id, &technique.id);
        let mut node = GraphNode::new(&node_id, NodeKind::Technique, &technique.name);
        if category_ids.contains(technique.category_id.as_str()) {
            node = node.with_parent(chart_category_id(&technique.category_id));
            graph.add_edge(GraphEdge::new(
                chart_category_id(&technique.category_id),
                node_id,
                EdgeKind::CategoryTechnique,
            ));
        }
        graph.add_node(node);
    }

    let visible_providers: BTreeSet<&str> = dataset
        .providers
        .iter()
        .filter(|p| filters.allows_provider(&p.id))
        .map(|p| p.id.as_str())
        .collect();

    for provider in &dataset.providers {
        if visible_providers.contains(provider.id.as_str()) {
            graph.add_node(GraphNode::new(
                chart_provider_id(&provider.id),
                NodeKind::Provider,
                &provider.name,
            ));
        }
    }

    // (provider node, technique node) -> backing evidence ids
    let mut links: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
    for evidence in &dataset.evidence {
        if !visible_providers.contains(evidence.provider_id.as_str()) {
            continue;
        }
        for technique_id in &evidence.technique_ids {
            let Some(technique) = dataset.technique(technique_id) else {
                tracing::warn!(
                    "Evidence {} references unknown technique {}",
                    evidence.id,
                    technique_id
                );
                continue;
            };
            if !filters.allows_technique(&technique.id)
                || !filters.allows_category(&technique.category_id)
            {
                continue;
            }
            let key = (
                chart_provider_id(&evidence.provider_id),
                chart_technique_id(&technique.category_id, &technique.id),
            );
            let backing = links.entry(key).or_default();
            if !backing.contains(&evidence.id) {
                backing.push(evidence.id.clone());
            }
        }
    }

    for ((provider, technique), evidence) in links {
        graph.add_edge(
            GraphEdge::new(provider, technique, EdgeKind::ProviderTechnique).with_evidence(evidence),
        );
    }

    tracing::debug!(
        "Unified chart built: {} nodes, {} edges (filters active: {})",
        graph.len(),
        graph.edges().len(),
        !filters.is_empty()
    );
    graph
}
