use crate::catalog::ClusterCatalog;
use crate::error::{ClusterError, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub event_probability: f64,
    pub variable_probability: Option<f64>,
}

/// Frequency profile of `template` and of its variable combination.
///
/// Unknown templates get `1 / (total_lines_processed + 1)`, below anything
/// observed. For known ones the variable tree is walked in ascending position
/// order and the deepest matched count is divided by the template's line
/// count; if the first value was never seen the variable probability is 0.
pub fn score<S: AsRef<str>>(
    template: &str,
    variables: &[S],
    catalog: &ClusterCatalog,
    total_lines_processed: usize,
) -> Result<Score> {
    let Some(entry) = catalog.get(template) else {
        return Ok(Score {
            event_probability: unseen_probability(total_lines_processed),
            variable_probability: None,
        });
    };
    if total_lines_processed == 0 {
        return Err(ClusterError::EmptyHistory);
    }

    let event_probability = entry.total_lines as f64 / total_lines_processed as f64;
    let variable_probability = if variables.is_empty() || entry.total_lines == 0 {
        None
    } else {
        let count = entry.variables.prefix_count(variables).unwrap_or(0);
        Some(count as f64 / entry.total_lines as f64)
    };

    Ok(Score { event_probability, variable_probability })
}

/// Smoothed probability of a template never seen in `total_lines_processed` lines.
pub fn unseen_probability(total_lines_processed: usize) -> f64 {
    1.0 / (total_lines_processed as f64 + 1.0)
}
