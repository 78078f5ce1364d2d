use crate::clustering::ClusterGroup;
use ahash::AHashSet;

/// Distinct token values seen at each position, indexed by position.
pub type CardinalityMap<'a> = Vec<AHashSet<&'a str>>;

pub fn cardinality_map(group: &ClusterGroup) -> CardinalityMap<'_> {
    let mut map: CardinalityMap<'_> = vec![AHashSet::new(); group.length()];
    for member in group.members() {
        for (position, token) in member.iter().enumerate() {
            map[position].insert(token.as_str());
        }
    }
    map
}
