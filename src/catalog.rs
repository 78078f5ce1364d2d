use crate::error::{ClusterError, Result};
use crate::partition::PriorClusters;
use crate::template::{FinalCluster, VariableTree};
use crate::tokenize::{is_var_token, tokenize};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io::{Read, Write};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "vars")]
    pub variables: VariableTree,
    pub total_lines: usize,
    #[serde(rename = "line_len")]
    pub line_length: usize,
}

/// All finalized templates keyed by identity string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSummary {
    pub template: String,
    pub total_lines: usize,
    pub line_length: usize,
    pub variable_count: usize,
    pub distinct_leading_values: usize,
}

impl ClusterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, template: &str) -> Option<&CatalogEntry> {
        self.entries.get(template)
    }

    pub fn contains(&self, template: &str) -> bool {
        self.entries.contains_key(template)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Adds an entry; an identity that is already present is an error, never
    /// an overwrite.
    pub fn insert(&mut self, template: String, entry: CatalogEntry) -> Result<()> {
        match self.entries.entry(template) {
            Entry::Occupied(o) => Err(ClusterError::DuplicateTemplate(o.key().clone())),
            Entry::Vacant(v) => {
                v.insert(entry);
                Ok(())
            }
        }
    }

    pub fn insert_final(&mut self, cluster: FinalCluster) -> Result<()> {
        let identity = cluster.identity();
        self.insert(identity, cluster.entry)
    }

    /// Sum of `total_lines` over every template.
    pub fn total_lines(&self) -> usize {
        self.entries.values().map(|e| e.total_lines).sum()
    }

    /// Template identities re-tokenized by length, ready to be merged into a
    /// later run.
    pub fn prior_clusters(&self) -> PriorClusters {
        let mut prior = PriorClusters::new();
        for (template, entry) in &self.entries {
            let tokens = tokenize(template);
            if tokens.len() == entry.line_length {
                prior.entry(entry.line_length).or_default().push(tokens);
            }
        }
        prior
    }

    /// Most frequent first; ties broken by template text.
    pub fn summaries(&self) -> Vec<TemplateSummary> {
        self.entries
            .iter()
            .map(|(template, entry)| TemplateSummary {
                template: template.clone(),
                total_lines: entry.total_lines,
                line_length: entry.line_length,
                variable_count: template.split_whitespace().filter(|t| is_var_token(t)).count(),
                distinct_leading_values: entry.variables.len(),
            })
            .sorted_by(|a, b| b.total_lines.cmp(&a.total_lines).then_with(|| a.template.cmp(&b.template)))
            .collect()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_writer_pretty<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
