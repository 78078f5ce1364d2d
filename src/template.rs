use crate::catalog::CatalogEntry;
use crate::clustering::ClusterGroup;
use crate::tokenize::{is_var_token, VAR_TOKEN};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token layout of a finalized cluster. Identity is the space-joined tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTemplate {
    tokens: Vec<String>,
    variable_positions: Vec<usize>,
}

impl EventTemplate {
    pub fn from_identity(identity: &str) -> Self {
        let tokens: Vec<String> = identity.split_whitespace().map(str::to_owned).collect();
        let variable_positions = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| is_var_token(t))
            .map(|(i, _)| i)
            .collect();
        Self { tokens, variable_positions }
    }

    pub fn identity(&self) -> String {
        self.tokens.join(" ")
    }

    /// Ascending; this is the walk order of the template's variable tree.
    pub fn variable_positions(&self) -> &[usize] {
        &self.variable_positions
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableNode {
    pub count: usize,
    pub children: VariableTree,
}

/// Observed combinations of variable values for one template. Each level is
/// keyed by the value at the next variable position; `count` on a node is the
/// number of lines sharing the path down to it.
///
/// Serialized flat, as the list of paths that end at each node, so wide
/// templates don't turn into deeply nested JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<VariableRow>", into = "Vec<VariableRow>")]
pub struct VariableTree(BTreeMap<String, VariableNode>);

/// `count` lines whose variable values are exactly `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRow {
    pub path: Vec<String>,
    pub count: usize,
}

impl VariableTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, value: &str) -> Option<&VariableNode> {
        self.0.get(value)
    }

    pub fn record<'a, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.record_n(values, 1);
    }

    pub fn record_n<'a, I>(&mut self, values: I, times: usize)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut level = self;
        for value in values {
            let node = level.0.entry(value.to_owned()).or_default();
            node.count += times;
            level = &mut node.children;
        }
    }

    /// One row per node that some recorded path ends at, in key order.
    pub fn rows(&self) -> Vec<VariableRow> {
        let mut rows = Vec::new();
        let mut pending: Vec<(Vec<String>, &VariableTree)> = vec![(Vec::new(), self)];
        while let Some((prefix, level)) = pending.pop() {
            for (value, node) in level.0.iter() {
                let mut path = prefix.clone();
                path.push(value.clone());
                let ending = node.count.saturating_sub(node.children.total());
                if ending > 0 {
                    rows.push(VariableRow { path: path.clone(), count: ending });
                }
                if !node.children.is_empty() {
                    pending.push((path, &node.children));
                }
            }
        }
        rows.sort_by(|a, b| a.path.cmp(&b.path));
        rows
    }

    /// Count of the deepest node reached by following `values`. Stops at the
    /// first value that was never observed; `None` if even the first is unknown.
    pub fn prefix_count<S: AsRef<str>>(&self, values: &[S]) -> Option<usize> {
        let mut level = self;
        let mut count = None;
        for value in values {
            match level.get(value.as_ref()) {
                Some(node) => {
                    count = Some(node.count);
                    level = &node.children;
                }
                None => break,
            }
        }
        count
    }

    /// Total of the top-level counts, i.e. the number of recorded paths.
    pub fn total(&self) -> usize {
        self.0.values().map(|n| n.count).sum()
    }
}

impl From<Vec<VariableRow>> for VariableTree {
    fn from(rows: Vec<VariableRow>) -> Self {
        let mut tree = VariableTree::new();
        for row in rows.iter().filter(|r| r.count > 0 && !r.path.is_empty()) {
            tree.record_n(row.path.iter().map(String::as_str), row.count);
        }
        tree
    }
}

impl From<VariableTree> for Vec<VariableRow> {
    fn from(tree: VariableTree) -> Self {
        tree.rows()
    }
}

#[derive(Debug, Clone)]
pub struct FinalCluster {
    pub template: EventTemplate,
    pub entry: CatalogEntry,
}

impl FinalCluster {
    pub fn identity(&self) -> String {
        self.template.identity()
    }
}

/// Freezes a terminal group into its template and variable tree.
///
/// A lone line that never had a position fixed is its own literal template.
/// Otherwise every position not fixed becomes a marker; this includes a
/// multi-member group in which nothing was found constant, so each of its
/// members still matches the result.
pub fn finalize(group: ClusterGroup) -> FinalCluster {
    let length = group.length();
    let variable_positions = if group.size() <= 1 && group.fixed_positions().is_empty() {
        Vec::new()
    } else {
        group.variable_positions()
    };
    let example = group.members().first();

    let tokens: Vec<String> = (0..length)
        .map(|position| {
            if variable_positions.binary_search(&position).is_ok() {
                VAR_TOKEN.to_owned()
            } else {
                example.map(|m| m[position].clone()).unwrap_or_default()
            }
        })
        .collect();

    let mut variables = VariableTree::new();
    if !variable_positions.is_empty() {
        for member in group.members() {
            variables.record(variable_positions.iter().map(|&p| member[p].as_str()));
        }
    }

    FinalCluster {
        template: EventTemplate { tokens, variable_positions },
        entry: CatalogEntry { variables, total_lines: group.size(), line_length: length },
    }
}
