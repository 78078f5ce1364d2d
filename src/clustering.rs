use crate::cardinality::cardinality_map;
use crate::catalog::ClusterCatalog;
use crate::config::ClusterOpts;
use crate::error::Result;
use crate::partition::{partition_lines, PriorClusters};
use crate::template::{finalize, FinalCluster};
use crate::tokenize::{TokenSequence, VAR_TOKEN};
use ahash::AHashMap;
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// A set of same-length token sequences being progressively subdivided.
///
/// Every group owns its `fixed` set; children receive their own copy, so
/// sibling branches never observe each other's discovered constants.
#[derive(Debug, Clone)]
pub struct ClusterGroup {
    members: Vec<TokenSequence>,
    fixed: BTreeSet<usize>,
    length: usize,
}

impl ClusterGroup {
    pub fn root(members: Vec<TokenSequence>, length: usize) -> Self {
        Self { members, fixed: BTreeSet::new(), length }
    }

    pub fn with_fixed(members: Vec<TokenSequence>, fixed: BTreeSet<usize>, length: usize) -> Self {
        Self { members, fixed, length }
    }

    pub fn members(&self) -> &[TokenSequence] {
        &self.members
    }

    pub fn fixed_positions(&self) -> &BTreeSet<usize> {
        &self.fixed
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Positions not confirmed constant, ascending.
    pub fn variable_positions(&self) -> Vec<usize> {
        (0..self.length).filter(|p| !self.fixed.contains(p)).collect()
    }

    /// Picks the unresolved position with the fewest distinct values whose
    /// uniqueness ratio stays under `threshold`; on a tie the rightmost such
    /// position wins. Positions that turn out to be constant are recorded as
    /// fixed along the way. `None` means terminal.
    ///
    /// A lone member is terminal as-is and keeps the fixed positions it
    /// inherited.
    pub fn find_split_position(&mut self, threshold: f64) -> Option<usize> {
        if self.members.len() <= 1 {
            return None;
        }

        let cardinality = cardinality_map(self);
        let size = self.members.len() as f64;
        let mut constant = Vec::new();
        let mut best: Option<(usize, usize)> = None;

        for (position, values) in cardinality.iter().enumerate() {
            if self.fixed.contains(&position) {
                continue;
            }
            // already resolved as a variable by an earlier run
            if values.contains(VAR_TOKEN) {
                continue;
            }
            let distinct = values.len();
            if distinct == 1 {
                constant.push(position);
                continue;
            }
            if (distinct as f64) / size >= threshold {
                continue;
            }
            if best.map_or(true, |(_, fewest)| distinct <= fewest) {
                best = Some((position, distinct));
            }
        }

        self.fixed.extend(constant);
        best.map(|(position, _)| position)
    }

    /// Partitions members by their token at `position`. Children keep the
    /// order in which their values first appear.
    pub fn split(self, position: usize) -> Vec<ClusterGroup> {
        let mut fixed = self.fixed;
        fixed.insert(position);

        let mut slots: AHashMap<String, usize> = AHashMap::new();
        let mut buckets: Vec<Vec<TokenSequence>> = Vec::new();
        for member in self.members {
            let slot = *slots.entry(member[position].clone()).or_insert_with(|| {
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            buckets[slot].push(member);
        }

        buckets
            .into_iter()
            .map(|members| ClusterGroup::with_fixed(members, fixed.clone(), self.length))
            .collect()
    }
}

enum Step {
    Split(Vec<ClusterGroup>),
    Final(FinalCluster),
}

fn refine(mut group: ClusterGroup, threshold: f64) -> Step {
    match group.find_split_position(threshold) {
        Some(position) => Step::Split(group.split(position)),
        None => Step::Final(finalize(group)),
    }
}

/// Runs partitioning, round-based refinement and finalization over `lines`,
/// merging in `prior` template lines of matching length.
pub fn build_catalog<S: AsRef<str>>(
    lines: &[S],
    prior: Option<&PriorClusters>,
    opts: &ClusterOpts,
) -> Result<ClusterCatalog> {
    opts.validate()?;
    let threshold = opts.threshold;
    let mut worklist = partition_lines(lines, prior);
    let mut catalog = ClusterCatalog::default();
    let mut round = 0usize;

    while !worklist.is_empty() {
        if opts.max_rounds.is_some_and(|cap| round >= cap) {
            warn!(round, remaining = worklist.len(), "round cap reached; finalizing remaining groups");
            for mut group in worklist {
                // still collect constant positions before freezing the group
                let _ = group.find_split_position(threshold);
                catalog.insert_final(finalize(group))?;
            }
            break;
        }

        let steps: Vec<Step> = if opts.parallel {
            worklist.into_par_iter().map(|g| refine(g, threshold)).collect()
        } else {
            worklist.into_iter().map(|g| refine(g, threshold)).collect()
        };

        let mut next = Vec::new();
        let mut finalized = 0usize;
        for step in steps {
            match step {
                Step::Split(children) => next.extend(children),
                Step::Final(cluster) => {
                    catalog.insert_final(cluster)?;
                    finalized += 1;
                }
            }
        }
        debug!(round, finalized, pending = next.len(), "clustering round done");
        worklist = next;
        round += 1;
    }

    Ok(catalog)
}
