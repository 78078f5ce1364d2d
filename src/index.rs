use crate::catalog::ClusterCatalog;
use crate::error::{ClusterError, Result};
use crate::template::EventTemplate;
use crate::tokenize::VAR_TOKEN;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexNode {
    children: BTreeMap<String, IndexNode>,
}

impl IndexNode {
    fn insert<'a, I: IntoIterator<Item = &'a str>>(&mut self, tokens: I) {
        let mut node = self;
        for token in tokens {
            node = node.children.entry(token.to_owned()).or_default();
        }
    }

    fn leaf_count(&self) -> usize {
        let mut leaves = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if node.children.is_empty() {
                leaves += 1;
            }
            pending.extend(node.children.values());
        }
        leaves
    }
}

// Long templates make deep chains; unlink them level by level instead of
// letting the default drop recurse once per token.
impl Drop for IndexNode {
    fn drop(&mut self) {
        let mut pending: Vec<IndexNode> = std::mem::take(&mut self.children).into_values().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(std::mem::take(&mut node.children).into_values());
        }
    }
}

/// Trie over template identities: first keyed by token count, then by each
/// literal token or the variable marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventIndex {
    by_length: BTreeMap<usize, IndexNode>,
}

impl EventIndex {
    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_length.keys().copied()
    }

    pub fn template_count(&self) -> usize {
        self.by_length.values().map(IndexNode::leaf_count).sum()
    }

    /// Maps `line` to the identity of the template it belongs to.
    ///
    /// A literal child is always tried before the marker child. If the literal
    /// branch dead-ends further down, the marker branch at that step is tried
    /// instead. The walk keeps its own stack, one frame per matched token.
    pub fn match_line(&self, line: &str) -> Option<String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let bucket = self.by_length.get(&tokens.len())?;
        descend(bucket, &tokens).map(|path| path.join(" "))
    }
}

#[derive(Debug, Clone, Copy)]
enum Branch {
    Literal,
    Marker,
    Exhausted,
}

fn descend<'a>(bucket: &'a IndexNode, tokens: &[&str]) -> Option<Vec<&'a str>> {
    let mut path: Vec<&'a str> = Vec::with_capacity(tokens.len());
    let mut stack: Vec<(&'a IndexNode, Branch)> = Vec::with_capacity(tokens.len() + 1);
    stack.push((bucket, Branch::Literal));

    // path.len() == stack.len() - 1 between iterations
    while let Some((node, branch)) = stack.last_mut() {
        let depth = path.len();
        if depth == tokens.len() {
            return Some(path);
        }
        let current: &'a IndexNode = *node;
        let token = tokens[depth];
        let next = match *branch {
            Branch::Literal => {
                *branch = Branch::Marker;
                current.children.get_key_value(token)
            }
            Branch::Marker => {
                *branch = Branch::Exhausted;
                if token == VAR_TOKEN {
                    None
                } else {
                    current.children.get_key_value(VAR_TOKEN)
                }
            }
            Branch::Exhausted => {
                stack.pop();
                path.pop();
                continue;
            }
        };
        if let Some((key, child)) = next {
            path.push(key.as_str());
            stack.push((child, Branch::Literal));
        }
    }
    None
}

/// Builds the trie for every template in `catalog`, one length bucket per
/// rayon task.
pub fn build_index(catalog: &ClusterCatalog) -> EventIndex {
    let mut by_length: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (template, entry) in catalog.iter() {
        by_length.entry(entry.line_length).or_default().push(template);
    }

    let buckets: Vec<(usize, IndexNode)> = by_length
        .into_par_iter()
        .map(|(length, templates)| {
            let mut root = IndexNode::default();
            for template in templates {
                root.insert(template.split_whitespace());
            }
            (length, root)
        })
        .collect();

    let index = EventIndex { by_length: buckets.into_iter().collect() };
    debug!(templates = catalog.len(), lengths = index.by_length.len(), "event index built");
    index
}

pub fn match_line(index: &EventIndex, line: &str) -> Option<String> {
    index.match_line(line)
}

/// Raw tokens of `line` sitting at the template's marker positions, left to right.
pub fn extract_variables(line: &str, template: &str) -> Result<Vec<String>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let template = EventTemplate::from_identity(template);
    if tokens.len() != template.len() {
        return Err(ClusterError::ShapeMismatch { expected: template.len(), actual: tokens.len() });
    }
    Ok(template.variable_positions().iter().map(|&p| tokens[p].to_owned()).collect())
}
