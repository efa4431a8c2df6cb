use std::fmt::Debug;

use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::miner::itemset::{FrequentItemsets, Item, Itemset};

/// Association rule `antecedent => consequent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "I: Serialize",
    deserialize = "I: Deserialize<'de> + Ord"
))]
pub struct Rule<I> {
    pub antecedent: Itemset<I>,
    pub consequent: Itemset<I>,
    /// count(itemset) / n
    pub support: f64,
    /// count(itemset) / count(antecedent)
    pub confidence: f64,
    /// confidence / (count(consequent) / n)
    pub lift: f64,
}

impl<I: Item> Rule<I> {
    /// Score one split of `itemset`
    /// Returns `None` when either side has no recorded support (it was pruned
    /// or never counted) or the confidence is below `min_confidence`.
    fn derive(
        frequent: &FrequentItemsets<I>,
        antecedent: Itemset<I>,
        consequent: Itemset<I>,
        itemset_count: u64,
        min_confidence: f64,
        transaction_count: u64,
    ) -> Option<Self> {
        let (antecedent_count, consequent_count) = match (
            frequent.support_of(&antecedent).filter(|&c| c > 0),
            frequent.support_of(&consequent).filter(|&c| c > 0),
        ) {
            (Some(a), Some(c)) => (a, c),
            _ => {
                trace!(?antecedent, ?consequent, "subset support missing, rule skipped");
                return None;
            }
        };
        let n = transaction_count as f64;
        let confidence = itemset_count as f64 / antecedent_count as f64;
        if confidence < min_confidence {
            return None;
        }
        let lift = confidence / (consequent_count as f64 / n);
        Some(Rule {
            antecedent,
            consequent,
            support: itemset_count as f64 / n,
            confidence,
            lift,
        })
    }
}

/// Rule collection
/// Order carries no meaning until one of the sort methods is applied.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "I: Serialize",
    deserialize = "I: Deserialize<'de> + Ord"
))]
pub struct RuleList<I> {
    pub list: Vec<Rule<I>>,
}

impl<I> Default for RuleList<I> {
    fn default() -> Self {
        Self { list: Vec::new() }
    }
}

impl<I> RuleList<I> {
    pub fn new(list: Vec<Rule<I>>) -> Self {
        Self { list }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule<I>> {
        self.list.iter()
    }

    /// Sort by descending confidence, ties broken by lift
    pub fn sort_by_confidence(&mut self) -> &mut Self {
        self.list.retain(|r| !r.confidence.is_nan() && !r.lift.is_nan());
        self.list.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| b.lift.total_cmp(&a.lift))
        });
        self
    }

    /// Sort by descending lift
    pub fn sort_by_lift(&mut self) -> &mut Self {
        self.list.retain(|r| !r.lift.is_nan());
        self.list.sort_by(|a, b| b.lift.total_cmp(&a.lift));
        self
    }

    /// Sort by descending support
    pub fn sort_by_support(&mut self) -> &mut Self {
        self.list.retain(|r| !r.support.is_nan());
        self.list.sort_by(|a, b| b.support.total_cmp(&a.support));
        self
    }

    /// keep the first `n` rules
    pub fn truncate(&mut self, n: usize) -> &mut Self {
        self.list.truncate(n);
        self
    }
}

impl<I: Item> RuleList<I> {
    /// find the rule for an exact (antecedent, consequent) pair
    pub fn find(&self, antecedent: &Itemset<I>, consequent: &Itemset<I>) -> Option<&Rule<I>> {
        self.list
            .iter()
            .find(|r| &r.antecedent == antecedent && &r.consequent == consequent)
    }
}

impl<I> IntoIterator for RuleList<I> {
    type Item = Rule<I>;
    type IntoIter = std::vec::IntoIter<Rule<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.into_iter()
    }
}

impl<I> Debug for RuleList<I>
where
    I: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            // one rule per line
            writeln!(f, "RuleList [")?;
            for rule in &self.list {
                writeln!(
                    f,
                    "    {:?} => {:?}: sup {:.6} conf {:.6} lift {:.6}",
                    rule.antecedent.as_slice(),
                    rule.consequent.as_slice(),
                    rule.support,
                    rule.confidence,
                    rule.lift
                )?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

/// Derive all rules from the frequent itemset sequence
///
/// Every itemset of cardinality >= 2 is split into each non-empty proper
/// subset (antecedent) and its complement (consequent). Splits whose sides
/// were not frequent are skipped, never reported as errors.
pub fn generate_rules<I: Item>(
    frequent: &FrequentItemsets<I>,
    min_confidence: f64,
    transaction_count: u64,
    parallel: bool,
) -> RuleList<I> {
    if transaction_count == 0 {
        return RuleList::default();
    }
    let itemsets: Vec<(&Itemset<I>, u64)> = frequent
        .levels()
        .iter()
        .skip(1)
        .flat_map(|table| table.iter().map(|(set, &count)| (set, count)))
        .collect();

    let list: Vec<Rule<I>> = if parallel {
        itemsets
            .par_iter()
            .flat_map_iter(|&(itemset, count)| {
                rules_for_itemset(frequent, itemset, count, min_confidence, transaction_count)
            })
            .collect()
    } else {
        itemsets
            .iter()
            .flat_map(|&(itemset, count)| {
                rules_for_itemset(frequent, itemset, count, min_confidence, transaction_count)
            })
            .collect()
    };
    RuleList::new(list)
}

fn rules_for_itemset<I: Item>(
    frequent: &FrequentItemsets<I>,
    itemset: &Itemset<I>,
    itemset_count: u64,
    min_confidence: f64,
    transaction_count: u64,
) -> Vec<Rule<I>> {
    let mut rules = Vec::new();
    for size in 1..itemset.len() {
        for antecedent in itemset.iter().cloned().combinations(size) {
            let antecedent = Itemset::from_sorted_unchecked(antecedent);
            let consequent = itemset.difference(&antecedent);
            if let Some(rule) = Rule::derive(
                frequent,
                antecedent,
                consequent,
                itemset_count,
                min_confidence,
                transaction_count,
            ) {
                rules.push(rule);
            }
        }
    }
    rules
}

/// Rules compared as a set of (antecedent, consequent) keys
#[cfg(test)]
pub(crate) fn rule_keys<I: Item>(
    rules: &RuleList<I>,
) -> std::collections::HashSet<(Itemset<I>, Itemset<I>)> {
    rules
        .iter()
        .map(|r| (r.antecedent.clone(), r.consequent.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::itemset::SupportTable;

    fn set(items: &[&'static str]) -> Itemset<&'static str> {
        Itemset::new(items.iter().copied())
    }

    fn scenario_levels() -> FrequentItemsets<&'static str> {
        let mut singles = SupportTable::new(1);
        singles.insert(set(&["A"]), 3);
        singles.insert(set(&["B"]), 3);
        singles.insert(set(&["C"]), 2);
        let mut pairs = SupportTable::new(2);
        pairs.insert(set(&["A", "B"]), 2);
        pairs.insert(set(&["B", "C"]), 2);
        FrequentItemsets::from_levels(vec![singles, pairs]).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-4, "{actual} != {expected}");
    }

    #[test]
    fn scenario_rules_have_exact_scores() {
        let rules = generate_rules(&scenario_levels(), 0.5, 4, false);
        assert_eq!(rules.len(), 4);

        let expected = [
            (&["A"], &["B"], 0.5, 0.6667, 0.8889),
            (&["B"], &["A"], 0.5, 0.6667, 0.8889),
            (&["B"], &["C"], 0.5, 0.6667, 1.3333),
            (&["C"], &["B"], 0.5, 1.0, 1.3333),
        ];
        for (a, c, support, confidence, lift) in expected {
            let rule = rules.find(&set(a), &set(c)).expect("rule present");
            assert_close(rule.support, support);
            assert_close(rule.confidence, confidence);
            assert_close(rule.lift, lift);
        }
    }

    #[test]
    fn confidence_cutoff_is_inclusive_and_exclusive_below() {
        let levels = scenario_levels();
        // only C => B reaches 1.0
        let strict = generate_rules(&levels, 0.9, 4, false);
        assert_eq!(strict.len(), 1);
        assert!(strict.find(&set(&["C"]), &set(&["B"])).is_some());

        let exact = generate_rules(&levels, 2.0 / 3.0, 4, false);
        assert_eq!(exact.len(), 4);
    }

    #[test]
    fn missing_subset_support_skips_rule() {
        // ABC frequent, but the pair AC and the single C were pruned
        let mut singles = SupportTable::new(1);
        singles.insert(set(&["A"]), 5);
        singles.insert(set(&["B"]), 5);
        let mut pairs = SupportTable::new(2);
        pairs.insert(set(&["A", "B"]), 4);
        pairs.insert(set(&["B", "C"]), 4);
        let mut triples = SupportTable::new(3);
        triples.insert(set(&["A", "B", "C"]), 3);
        let levels = FrequentItemsets::from_levels(vec![singles, pairs, triples]).unwrap();

        let rules = generate_rules(&levels, 0.0, 10, false);
        for rule in rules.iter() {
            assert!(levels.support_of(&rule.antecedent).is_some());
            assert!(levels.support_of(&rule.consequent).is_some());
        }
        // A => BC and BC => A survive, anything touching C alone or AC does not
        assert!(rules.find(&set(&["A"]), &set(&["B", "C"])).is_some());
        assert!(rules.find(&set(&["B", "C"]), &set(&["A"])).is_some());
        assert!(rules.find(&set(&["C"]), &set(&["A", "B"])).is_none());
        assert!(rules.find(&set(&["A", "C"]), &set(&["B"])).is_none());
        assert!(rules.find(&set(&["B"]), &set(&["C"])).is_none());
    }

    #[test]
    fn parallel_matches_sequential() {
        let levels = scenario_levels();
        let seq = generate_rules(&levels, 0.1, 4, false);
        let par = generate_rules(&levels, 0.1, 4, true);
        assert_eq!(rule_keys(&seq), rule_keys(&par));
    }

    #[test]
    fn no_transactions_no_rules() {
        assert!(generate_rules(&scenario_levels(), 0.0, 0, false).is_empty());
    }

    #[test]
    fn sorting_orders_descending() {
        let mut rules = generate_rules(&scenario_levels(), 0.5, 4, false);
        rules.sort_by_confidence();
        assert_eq!(rules.list[0].antecedent, set(&["C"]));
        rules.sort_by_lift();
        assert!(rules.list[0].lift >= rules.list[3].lift);
        rules.truncate(2);
        assert_eq!(rules.len(), 2);
        let pretty = format!("{:#?}", rules);
        assert!(pretty.starts_with("RuleList ["));
    }
}
