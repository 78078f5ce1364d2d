use crate::catalog::ClusterCatalog;
use crate::clustering::build_catalog;
use crate::config::ClusterOpts;
use crate::error::Result;
use crate::index::{build_index, extract_variables, EventIndex};
use crate::partition::PriorClusters;
use crate::scoring::{score, unseen_probability};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineScore {
    pub template: Option<String>,
    pub variables: Vec<String>,
    pub event_probability: f64,
    pub variable_probability: Option<f64>,
}

/// A catalog together with its index and the line total used for scoring.
#[derive(Debug, Clone)]
pub struct TemplateModel {
    catalog: ClusterCatalog,
    index: EventIndex,
    total_lines: usize,
}

impl TemplateModel {
    pub fn train<S: AsRef<str>>(lines: &[S], prior: Option<&PriorClusters>, opts: &ClusterOpts) -> Result<Self> {
        Ok(Self::from_catalog(build_catalog(lines, prior, opts)?))
    }

    pub fn from_catalog(catalog: ClusterCatalog) -> Self {
        let index = build_index(&catalog);
        let total_lines = catalog.total_lines();
        Self { catalog, index, total_lines }
    }

    /// Overrides the denominator used for event probabilities.
    pub fn with_total_lines(mut self, total_lines: usize) -> Self {
        self.total_lines = total_lines;
        self
    }

    pub fn catalog(&self) -> &ClusterCatalog {
        &self.catalog
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Match, extract and score in one pass.
    pub fn classify(&self, line: &str) -> Result<LineScore> {
        let Some(template) = self.index.match_line(line) else {
            return Ok(LineScore {
                template: None,
                variables: Vec::new(),
                event_probability: unseen_probability(self.total_lines),
                variable_probability: None,
            });
        };
        let variables = extract_variables(line, &template)?;
        let s = score(&template, &variables, &self.catalog, self.total_lines)?;
        Ok(LineScore {
            template: Some(template),
            variables,
            event_probability: s.event_probability,
            variable_probability: s.variable_probability,
        })
    }
}
