use crate::clustering::ClusterGroup;
use crate::tokenize::{tokenize, TokenSequence};
use ahash::AHashMap;
use std::collections::BTreeMap;

/// Previously discovered template lines, keyed by token count.
pub type PriorClusters = BTreeMap<usize, Vec<TokenSequence>>;

/// Groups lines by token count, one root group per length, ordered by length.
/// Prior template lines of a matching length are appended after the new lines
/// so an old template can absorb new members and refine itself.
pub fn partition_lines<S: AsRef<str>>(lines: &[S], prior: Option<&PriorClusters>) -> Vec<ClusterGroup> {
    let mut by_len: AHashMap<usize, Vec<TokenSequence>> = AHashMap::new();
    for line in lines {
        let tokens = tokenize(line.as_ref());
        if tokens.is_empty() {
            continue;
        }
        by_len.entry(tokens.len()).or_default().push(tokens);
    }

    let mut roots: Vec<(usize, Vec<TokenSequence>)> = by_len.into_iter().collect();
    roots.sort_unstable_by_key(|(len, _)| *len);

    roots
        .into_iter()
        .map(|(len, mut members)| {
            if let Some(old) = prior.and_then(|p| p.get(&len)) {
                members.extend(old.iter().filter(|t| t.len() == len).cloned());
            }
            ClusterGroup::root(members, len)
        })
        .collect()
}
