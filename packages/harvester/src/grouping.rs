//! Grouping of index rows that describe parts of one logical entity.
//!
//! Some categories list one index row per sub-territory while the detail
//! endpoint is keyed by the coarser entity. Rows are folded into groups
//! keyed by their natural key before any detail fetch is issued, so every
//! document is assembled exactly once.

use std::collections::HashMap;
use std::hash::Hash;

/// One or more index rows sharing a natural key.
///
/// Never empty: a group is created from its first row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityGroup<K, R> {
    key: K,
    head: R,
    tail: Vec<R>,
}

#[allow(clippy::len_without_is_empty)]
impl<K, R> EntityGroup<K, R> {
    fn new(key: K, head: R) -> Self {
        Self {
            key,
            head,
            tail: Vec::new(),
        }
    }

    /// Natural key shared by all members.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// First member in index order; used as the representative for the
    /// detail fetch.
    pub fn representative(&self) -> &R {
        &self.head
    }

    /// Members in index order.
    pub fn members(&self) -> impl Iterator<Item = &R> {
        std::iter::once(&self.head).chain(self.tail.iter())
    }

    /// Number of member rows.
    pub fn len(&self) -> usize {
        1 + self.tail.len()
    }

    /// Consume the group, returning its members in index order.
    pub fn into_members(self) -> Vec<R> {
        let mut members = Vec::with_capacity(1 + self.tail.len());
        members.push(self.head);
        members.extend(self.tail);
        members
    }
}

/// Group rows by natural key in a single pass.
///
/// Groups come out in first-seen order of their key; members keep their
/// index order. No row ends up in more than one group.
///
/// # Examples
/// ```
/// use seaaroundus_harvester::grouping::group_rows;
///
/// let rows = vec![(5, "A"), (5, "B"), (7, "C")];
/// let groups = group_rows(rows, |row| row.0);
///
/// assert_eq!(groups.len(), 2);
/// assert_eq!(*groups[0].key(), 5);
/// assert_eq!(groups[0].len(), 2);
/// ```
pub fn group_rows<K, R, F>(
    rows: impl IntoIterator<Item = R>,
    mut key_fn: F,
) -> Vec<EntityGroup<K, R>>
where
    K: Eq + Hash + Clone,
    F: FnMut(&R) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<EntityGroup<K, R>> = Vec::new();

    for row in rows {
        let key = key_fn(&row);
        match positions.get(&key) {
            Some(&position) => groups[position].tail.push(row),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push(EntityGroup::new(key, row));
            }
        }
    }

    groups
}
