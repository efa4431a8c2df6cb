use std::{fmt::Debug, hash::Hash};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MinerError, MinerResult};

/// Opaque item identifier
/// Anything hashable, ordered and shareable across threads can be mined.
pub trait Item: Clone + Eq + Hash + Ord + Send + Sync + Debug {}

impl<T> Item for T where T: Clone + Eq + Hash + Ord + Send + Sync + Debug {}

/// Immutable set of items
/// Members are kept sorted and unique, so equality and hashing only
/// depend on which items are present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "Vec<I>", bound(deserialize = "I: Deserialize<'de> + Ord"))]
pub struct Itemset<I> {
    items: Box<[I]>,
}

impl<I: Ord> Itemset<I> {
    pub fn new<T>(items: T) -> Self
    where
        T: IntoIterator<Item = I>,
    {
        let mut items: Vec<I> = items.into_iter().collect();
        items.sort_unstable();
        items.dedup();
        Self { items: items.into_boxed_slice() }
    }

    /// caller guarantees `items` is strictly ascending
    #[inline]
    pub(crate) fn from_sorted_unchecked(items: Vec<I>) -> Self {
        debug_assert!(items.windows(2).all(|w| w[0] < w[1]));
        Self { items: items.into_boxed_slice() }
    }

    #[inline]
    pub fn contains(&self, item: &I) -> bool {
        self.items.binary_search(item).is_ok()
    }

    /// true when every member is in `sorted`
    /// `sorted` must be ascending and unique (a cleaned transaction)
    pub fn is_subset_of(&self, sorted: &[I]) -> bool {
        if self.items.len() > sorted.len() {
            return false;
        }
        let mut rest = sorted.iter();
        'outer: for item in self.items.iter() {
            for other in rest.by_ref() {
                match other.cmp(item) {
                    std::cmp::Ordering::Less => continue,
                    std::cmp::Ordering::Equal => continue 'outer,
                    std::cmp::Ordering::Greater => return false,
                }
            }
            return false;
        }
        true
    }
}

impl<I: Ord + Clone> Itemset<I> {
    /// self - other
    pub fn difference(&self, other: &Itemset<I>) -> Itemset<I> {
        let items = self
            .items
            .iter()
            .filter(|item| !other.contains(item))
            .cloned()
            .collect::<Vec<I>>();
        Self::from_sorted_unchecked(items)
    }
}

impl<I> Itemset<I> {
    /// cardinality
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, I> {
        self.items.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[I] {
        &self.items
    }
}

impl<I: Ord> From<Vec<I>> for Itemset<I> {
    fn from(items: Vec<I>) -> Self {
        Self::new(items)
    }
}

impl<I: Ord> FromIterator<I> for Itemset<I> {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<I: Serialize> Serialize for Itemset<I> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.items.serialize(serializer)
    }
}

impl<'a, I> IntoIterator for &'a Itemset<I> {
    type Item = &'a I;
    type IntoIter = std::slice::Iter<'a, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Support counts for the itemsets of one cardinality (a level table)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "I: Serialize",
    deserialize = "I: Deserialize<'de> + Ord + Hash"
))]
pub struct SupportTable<I> {
    cardinality: usize,
    #[serde(with = "indexmap::map::serde_seq")]
    counts: IndexMap<Itemset<I>, u64>,
}

impl<I: Item> SupportTable<I> {
    pub fn new(cardinality: usize) -> Self {
        Self {
            cardinality,
            counts: IndexMap::new(),
        }
    }

    pub(crate) fn from_counts(cardinality: usize, counts: IndexMap<Itemset<I>, u64>) -> Self {
        debug_assert!(counts.keys().all(|set| set.len() == cardinality));
        Self { cardinality, counts }
    }

    /// Insert or overwrite a count
    /// Itemsets of another cardinality are ignored and reported with `false`.
    pub fn insert(&mut self, itemset: Itemset<I>, count: u64) -> bool {
        if itemset.len() != self.cardinality {
            return false;
        }
        self.counts.insert(itemset, count);
        true
    }

    /// count += 1
    #[inline]
    pub(crate) fn increment(&mut self, itemset: Itemset<I>) {
        *self.counts.entry(itemset).or_insert(0) += 1;
    }

    pub fn get(&self, itemset: &Itemset<I>) -> Option<u64> {
        self.counts.get(itemset).copied()
    }

    pub fn contains(&self, itemset: &Itemset<I>) -> bool {
        self.counts.contains_key(itemset)
    }

    /// keep only `count >= min_support`
    pub fn retain_frequent(mut self, min_support: f64) -> Self {
        self.counts.retain(|_, count| *count as f64 >= min_support);
        self
    }

    /// sorted union of all items in this table
    pub fn universe(&self) -> Vec<I> {
        let mut items: Vec<I> = self
            .counts
            .keys()
            .flat_map(|set| set.iter().cloned())
            .collect();
        items.sort_unstable();
        items.dedup();
        items
    }
}

impl<I> SupportTable<I> {
    /// size of the itemsets held here
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Itemset<I>, u64> {
        self.counts.iter()
    }

    pub fn itemsets(&self) -> indexmap::map::Keys<'_, Itemset<I>, u64> {
        self.counts.keys()
    }
}

/// Ordered sequence of level tables
/// index 0 holds 1-itemsets, index 1 holds 2-itemsets, ...
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "I: Serialize",
    deserialize = "I: Deserialize<'de> + Ord + Hash"
))]
pub struct FrequentItemsets<I> {
    levels: Vec<SupportTable<I>>,
}

// insertion order is not part of equality
impl<I: Eq + Hash> PartialEq for SupportTable<I> {
    fn eq(&self, other: &Self) -> bool {
        self.cardinality == other.cardinality && self.counts == other.counts
    }
}

impl<I: Eq + Hash> PartialEq for FrequentItemsets<I> {
    fn eq(&self, other: &Self) -> bool {
        self.levels == other.levels
    }
}

impl<I> Default for FrequentItemsets<I> {
    fn default() -> Self {
        Self { levels: Vec::new() }
    }
}

impl<I: Item> FrequentItemsets<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from prepared tables
    /// Table `i` must hold `(i + 1)`-itemsets.
    pub fn from_levels(levels: Vec<SupportTable<I>>) -> MinerResult<Self> {
        for (index, table) in levels.iter().enumerate() {
            if table.cardinality() != index + 1 {
                return Err(MinerError::LevelMismatch {
                    index,
                    cardinality: table.cardinality(),
                });
            }
        }
        Ok(Self { levels })
    }

    pub(crate) fn push_level(&mut self, table: SupportTable<I>) {
        debug_assert_eq!(table.cardinality(), self.levels.len() + 1);
        self.levels.push(table);
    }

    /// Support count of `itemset` if it was frequent
    /// Looks in the table matching its cardinality; pruned or unknown
    /// itemsets yield `None`.
    pub fn support_of(&self, itemset: &Itemset<I>) -> Option<u64> {
        if itemset.is_empty() {
            return None;
        }
        self.level(itemset.len())?.get(itemset)
    }

    /// number of frequent itemsets over every level
    pub fn total_itemsets(&self) -> usize {
        self.levels.iter().map(SupportTable::len).sum()
    }

    /// every (itemset, count) pair, smallest cardinality first
    pub fn iter(&self) -> impl Iterator<Item = (&Itemset<I>, u64)> {
        self.levels
            .iter()
            .flat_map(|table| table.iter().map(|(set, &count)| (set, count)))
    }
}

impl<I> FrequentItemsets<I> {
    pub fn levels(&self) -> &[SupportTable<I>] {
        &self.levels
    }

    /// level table for k-itemsets (k >= 1)
    pub fn level(&self, cardinality: usize) -> Option<&SupportTable<I>> {
        cardinality.checked_sub(1).and_then(|idx| self.levels.get(idx))
    }

    pub fn last_level(&self) -> Option<&SupportTable<I>> {
        self.levels.last()
    }

    /// number of non-empty levels, also the largest frequent cardinality
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn into_levels(self) -> Vec<SupportTable<I>> {
        self.levels
    }
}
