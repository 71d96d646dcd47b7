//! Normalized dataset records
//!
//! The ingestion pipeline that fetches and normalizes the remote JSON is not
//! part of this workspace; these types describe what it hands over.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The full normalized dataset consumed by the graph builders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub models: Vec<Model>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub techniques: Vec<Technique>,
}

impl Dataset {
    /// Look up a technique by its domain id
    pub fn technique(&self, id: &str) -> Option<&Technique> {
        self.techniques.iter().find(|t| t.id == id)
    }

    /// Techniques belonging to a category, in catalog order
    pub fn techniques_in(&self, category_id: &str) -> impl Iterator<Item = &Technique> {
        let category_id = category_id.to_string();
        self.techniques
            .iter()
            .filter(move |t| t.category_id == category_id)
    }
}

/// An LLM provider (lab or vendor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
}

/// A model released by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub provider_id: String,
}

/// A category grouping safety techniques (e.g. "Alignment", "Monitoring")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A safety technique in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    pub id: String,
    pub name: String,
    pub category_id: String,
}

/// A documentary evidence record (system card, paper, blog post)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    pub title: String,
    pub provider_id: String,
    /// Models this document covers
    #[serde(default)]
    pub model_ids: Vec<String>,
    /// Techniques this document attests to
    #[serde(default)]
    pub technique_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Active filters for the unified chart
///
/// Each set restricts by id; an empty set means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default)]
    pub providers: BTreeSet<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub techniques: BTreeSet<String>,
}

impl FilterSet {
    pub fn allows_provider(&self, provider_id: &str) -> bool {
        self.providers.is_empty() || self.providers.contains(provider_id)
    }

    pub fn allows_category(&self, category_id: &str) -> bool {
        self.categories.is_empty() || self.categories.contains(category_id)
    }

    pub fn allows_technique(&self, technique_id: &str) -> bool {
        self.techniques.is_empty() || self.techniques.contains(technique_id)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty() && self.categories.is_empty() && self.techniques.is_empty()
    }
}
