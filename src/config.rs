use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOpts {
    /// Upper bound (exclusive) on distinct-values / members for a position to
    /// be used as a split key.
    pub threshold: f64,
    /// Stop refining after this many rounds and finalize what is left.
    pub max_rounds: Option<usize>,
    /// Refine each round's groups on the rayon pool.
    pub parallel: bool,
}

impl Default for ClusterOpts {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD, max_rounds: None, parallel: true }
    }
}

impl ClusterOpts {
    pub fn validate(&self) -> Result<()> {
        if self.threshold > 0.0 && self.threshold <= 1.0 {
            Ok(())
        } else {
            Err(ClusterError::InvalidThreshold(self.threshold))
        }
    }
}
