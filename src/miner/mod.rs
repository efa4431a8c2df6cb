pub mod candidate;
pub mod counter;
pub mod itemset;
pub mod rules;
pub mod serde;
pub mod transaction;

use std::{marker::PhantomData, time::Instant};

use ::serde::{Deserialize, Serialize};
use num::ToPrimitive;
use tracing::{debug, info, info_span};

use crate::{
    error::{MinerError, MinerResult},
    miner::{
        candidate::generate_candidates,
        counter::{BitmapCounter, SupportCounter},
        itemset::{FrequentItemsets, Item},
        rules::{generate_rules, RuleList},
        transaction::TransactionSet,
    },
};

/// Thresholds for one mining run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MiningParams {
    /// absolute occurrence count, compared with `count >= min_support`
    min_support: f64,
    /// fraction in [0, 1]
    min_confidence: f64,
    /// count and derive rules on the rayon pool
    #[serde(default)]
    parallel: bool,
}

impl MiningParams {
    /// Checked constructor
    /// `min_support` is an absolute count and may be fractional (percent x n),
    /// `min_confidence` is a fraction.
    pub fn new<S, C>(min_support: S, min_confidence: C) -> MinerResult<Self>
    where
        S: ToPrimitive,
        C: ToPrimitive,
    {
        let min_support = min_support.to_f64().ok_or_else(|| {
            MinerError::invalid("min_support", f64::NAN, "not representable as f64")
        })?;
        let min_confidence = min_confidence.to_f64().ok_or_else(|| {
            MinerError::invalid("min_confidence", f64::NAN, "not representable as f64")
        })?;
        let params = Self {
            min_support,
            min_confidence,
            parallel: false,
        };
        params.validate()?;
        Ok(params)
    }

    /// opt in to parallel counting and rule derivation
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> MinerResult<()> {
        if !self.min_support.is_finite() {
            return Err(MinerError::invalid("min_support", self.min_support, "must be finite"));
        }
        if self.min_support < 0.0 {
            return Err(MinerError::invalid(
                "min_support",
                self.min_support,
                "must not be negative",
            ));
        }
        if !self.min_confidence.is_finite() || !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(MinerError::invalid(
                "min_confidence",
                self.min_confidence,
                "must be within [0, 1]",
            ));
        }
        Ok(())
    }

    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

/// Output of one mining run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "I: Serialize",
    deserialize = "I: Deserialize<'de> + Ord + std::hash::Hash"
))]
pub struct MiningResult<I> {
    pub frequent_itemsets: FrequentItemsets<I>,
    pub rules: RuleList<I>,
    /// number of non-empty transactions mined (the `n` of support and lift)
    pub transaction_count: u64,
    pub params: MiningParams,
}

impl<I: Eq + std::hash::Hash> PartialEq for MiningResult<I> {
    fn eq(&self, other: &Self) -> bool {
        self.transaction_count == other.transaction_count
            && self.params == other.params
            && self.frequent_itemsets == other.frequent_itemsets
            && self.rules == other.rules
    }
}

/// Level-wise frequent itemset miner
///
/// `LevelMiner<I, C>` has the following generic parameters:
/// - `I`: item type
/// - `C`: support counting strategy (e.g. `BitmapCounter`, `ScanCounter`)
///
/// Level 0 is counted straight from the transactions. Each later level k
/// proposes every k-subset of the previous level's items, counts them and
/// keeps those reaching the minimum support. The loop stops at the first
/// level with no survivors; that empty level is not kept.
#[derive(Debug, Clone)]
pub struct LevelMiner<I, C = BitmapCounter<I>> {
    params: MiningParams,
    _marker: PhantomData<fn() -> (I, C)>,
}

impl<I, C> LevelMiner<I, C>
where
    I: Item,
    C: SupportCounter<I> + Sync,
{
    pub fn new(params: MiningParams) -> MinerResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            _marker: PhantomData,
        })
    }

    pub fn params(&self) -> &MiningParams {
        &self.params
    }

    /// Run the level loop over cleaned transactions
    pub fn mine(&self, transactions: &TransactionSet<I>) -> FrequentItemsets<I> {
        let min_support = self.params.min_support;
        let mut frequent = FrequentItemsets::new();

        let seed = transactions.item_counts();
        let observed = seed.len();
        let seed = seed.retain_frequent(min_support);
        debug!(k = 1, candidates = observed, frequent = seed.len(), "level counted");
        if seed.is_empty() {
            return frequent;
        }
        frequent.push_level(seed);

        let counter = C::prepare(transactions);
        let mut k = 1;
        loop {
            let Some(previous) = frequent.last_level() else {
                break;
            };
            k += 1;
            let candidates = generate_candidates(previous, k);
            if candidates.is_empty() {
                debug!(k, "item universe exhausted");
                break;
            }
            let table = counter
                .count(transactions, &candidates, k, self.params.parallel)
                .retain_frequent(min_support);
            debug!(k, candidates = candidates.len(), frequent = table.len(), "level counted");
            if table.is_empty() {
                debug!(k, "no frequent itemsets, stopping");
                break;
            }
            frequent.push_level(table);
        }
        frequent
    }
}

/// Mine frequent itemsets and association rules
///
/// `transactions` are raw rows of items; duplicates inside a row are ignored
/// and empty rows are dropped before counting. `n` for support and lift is the
/// number of remaining rows. Parameters are validated before any work is done.
///
/// # Example
/// ```
/// use dhp_rule_miner::{mine, Itemset, MiningParams};
///
/// let rows = vec![vec!["A", "B"], vec!["A", "B", "C"], vec!["A"], vec!["B", "C"]];
/// let params = MiningParams::new(2, 0.5).unwrap();
/// let result = mine(rows, &params).unwrap();
///
/// assert_eq!(result.frequent_itemsets.len(), 2);
/// assert_eq!(result.rules.len(), 4);
/// let rule = result.rules.find(&Itemset::new(["C"]), &Itemset::new(["B"])).unwrap();
/// assert_eq!(rule.confidence, 1.0);
/// ```
pub fn mine<I, T, R>(transactions: T, params: &MiningParams) -> MinerResult<MiningResult<I>>
where
    I: Item,
    T: IntoIterator<Item = R>,
    R: IntoIterator<Item = I>,
{
    params.validate()?;
    let span = info_span!(
        "miner.mine",
        min_support = params.min_support,
        min_confidence = params.min_confidence
    );
    let _guard = span.enter();
    let start = Instant::now();

    let transactions = TransactionSet::new(transactions);
    let transaction_count = transactions.len() as u64;
    debug!(transactions = transaction_count, "transactions cleaned");

    let miner: LevelMiner<I> = LevelMiner::new(*params)?;
    let frequent_itemsets = miner.mine(&transactions);
    let rules = generate_rules(
        &frequent_itemsets,
        params.min_confidence,
        transaction_count,
        params.parallel,
    );

    info!(
        transactions = transaction_count,
        levels = frequent_itemsets.len(),
        itemsets = frequent_itemsets.total_itemsets(),
        rules = rules.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "mining finished"
    );
    Ok(MiningResult {
        frequent_itemsets,
        rules,
        transaction_count,
        params: *params,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use super::*;
    use crate::miner::{
        counter::ScanCounter,
        itemset::Itemset,
        rules::rule_keys,
    };

    fn scenario() -> Vec<Vec<&'static str>> {
        vec![
            vec!["A", "B"],
            vec!["A", "B", "C"],
            vec!["A"],
            vec!["B", "C"],
        ]
    }

    fn set(items: &[&'static str]) -> Itemset<&'static str> {
        Itemset::new(items.iter().copied())
    }

    #[test]
    fn scenario_levels_and_rules() {
        let params = MiningParams::new(2, 0.5).unwrap();
        let result = mine(scenario(), &params).unwrap();
        assert_eq!(result.transaction_count, 4);

        let frequent = &result.frequent_itemsets;
        assert_eq!(frequent.len(), 2);
        let singles = frequent.level(1).unwrap();
        assert_eq!(singles.len(), 3);
        assert_eq!(singles.get(&set(&["A"])), Some(3));
        assert_eq!(singles.get(&set(&["B"])), Some(3));
        assert_eq!(singles.get(&set(&["C"])), Some(2));

        let pairs = frequent.level(2).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs.get(&set(&["A", "B"])), Some(2));
        assert_eq!(pairs.get(&set(&["B", "C"])), Some(2));
        // AC occurs once, pruned
        assert_eq!(pairs.get(&set(&["A", "C"])), None);
        assert!(frequent.level(3).is_none());

        assert_eq!(result.rules.len(), 4);
        let c_b = result.rules.find(&set(&["C"]), &set(&["B"])).unwrap();
        assert!((c_b.support - 0.5).abs() < 1e-9);
        assert!((c_b.confidence - 1.0).abs() < 1e-9);
        assert!((c_b.lift - 4.0 / 3.0).abs() < 1e-9);
        let a_b = result.rules.find(&set(&["A"]), &set(&["B"])).unwrap();
        assert!((a_b.confidence - 2.0 / 3.0).abs() < 1e-9);
        assert!((a_b.lift - 8.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_parameters_are_rejected_up_front() {
        assert!(matches!(
            MiningParams::new(-1.0, 0.5),
            Err(MinerError::InvalidParameters { name: "min_support", .. })
        ));
        assert!(matches!(
            MiningParams::new(2, 1.5),
            Err(MinerError::InvalidParameters { name: "min_confidence", .. })
        ));
        assert!(MiningParams::new(2, -0.1).is_err());
        assert!(MiningParams::new(f64::NAN, 0.5).is_err());
        assert!(MiningParams::new(2, f64::INFINITY).is_err());
        assert!(MiningParams::new(2.5f32, 1u8).is_ok());
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let params = MiningParams::new(1, 0.5).unwrap();
        let result = mine(Vec::<Vec<u32>>::new(), &params).unwrap();
        assert!(result.frequent_itemsets.is_empty());
        assert!(result.rules.is_empty());
        assert_eq!(result.transaction_count, 0);

        let all_empty = mine(vec![Vec::<u32>::new(), Vec::new()], &params).unwrap();
        assert!(all_empty.frequent_itemsets.is_empty());
        assert_eq!(all_empty.transaction_count, 0);
    }

    #[test]
    fn support_above_everything_stops_at_seed() {
        let params = MiningParams::new(10, 0.0).unwrap();
        let result = mine(scenario(), &params).unwrap();
        assert!(result.frequent_itemsets.is_empty());
        assert!(result.rules.is_empty());
    }

    #[test]
    fn zero_support_terminates_at_longest_transaction() {
        let params = MiningParams::new(0, 0.0).unwrap();
        let result = mine(scenario(), &params).unwrap();
        // longest transaction has 3 items, nothing larger can occur
        assert_eq!(result.frequent_itemsets.len(), 3);
        let triples = result.frequent_itemsets.level(3).unwrap();
        assert_eq!(triples.get(&set(&["A", "B", "C"])), Some(1));
        assert_eq!(result.frequent_itemsets.level(2).unwrap().get(&set(&["A", "C"])), Some(1));
    }

    #[test]
    fn counters_produce_identical_levels() {
        let params = MiningParams::new(1, 0.0).unwrap();
        let tx = TransactionSet::new(scenario());
        let bitmap = LevelMiner::<&str, BitmapCounter<&str>>::new(params).unwrap().mine(&tx);
        let scan = LevelMiner::<&str, ScanCounter>::new(params).unwrap().mine(&tx);
        assert_eq!(bitmap, scan);
    }

    fn rows_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
        prop::collection::vec(prop::collection::vec(0u8..7, 0..5), 0..30)
    }

    proptest! {
        #[test]
        fn seed_level_matches_direct_enumeration(rows in rows_strategy(), min_support in 0u64..6) {
            let params = MiningParams::new(min_support, 0.0).unwrap();
            let result = mine(rows.clone(), &params).unwrap();

            let mut direct: HashMap<u8, u64> = HashMap::new();
            for row in &rows {
                let mut row = row.clone();
                row.sort_unstable();
                row.dedup();
                for item in row {
                    *direct.entry(item).or_insert(0) += 1;
                }
            }
            direct.retain(|_, count| *count >= min_support);

            match result.frequent_itemsets.level(1) {
                Some(singles) => {
                    prop_assert_eq!(singles.len(), direct.len());
                    for (item, count) in &direct {
                        prop_assert_eq!(singles.get(&Itemset::new([*item])), Some(*count));
                    }
                }
                None => prop_assert!(direct.is_empty()),
            }
        }

        #[test]
        fn level_invariants_hold(rows in rows_strategy(), min_support in 1u64..4) {
            let params = MiningParams::new(min_support, 0.0).unwrap();
            let result = mine(rows, &params).unwrap();
            let levels = result.frequent_itemsets.levels();
            for (idx, table) in levels.iter().enumerate() {
                prop_assert!(!table.is_empty());
                prop_assert_eq!(table.cardinality(), idx + 1);
                for (set, &count) in table.iter() {
                    prop_assert_eq!(set.len(), idx + 1);
                    prop_assert!(count >= min_support);
                }
                // every item of level k appears in level k - 1
                if idx > 0 {
                    let below = levels[idx - 1].universe();
                    for item in table.universe() {
                        prop_assert!(below.contains(&item));
                    }
                }
            }
        }

        #[test]
        fn rules_respect_bounds_and_cutoff(
            rows in rows_strategy(),
            min_support in 1u64..4,
            min_confidence in 0.0f64..=1.0,
        ) {
            let params = MiningParams::new(min_support, min_confidence).unwrap();
            let result = mine(rows, &params).unwrap();
            let n = result.transaction_count as f64;
            for rule in result.rules.iter() {
                prop_assert!(rule.confidence > 0.0 && rule.confidence <= 1.0);
                prop_assert!(rule.lift >= 0.0);
                prop_assert!(rule.confidence >= min_confidence);
                prop_assert!(rule.support > 0.0 && rule.support <= 1.0);
                prop_assert!(!rule.antecedent.is_empty() && !rule.consequent.is_empty());
                prop_assert!(rule.antecedent.iter().all(|i| !rule.consequent.contains(i)));
                let union =
                    Itemset::new(rule.antecedent.iter().chain(rule.consequent.iter()).copied());
                let count = result.frequent_itemsets.support_of(&union);
                prop_assert!(count.is_some());
                prop_assert!((rule.support - count.unwrap() as f64 / n).abs() < 1e-12);
            }

            // omitted splits with available supports must fall below the cutoff
            let all =
                generate_rules(&result.frequent_itemsets, 0.0, result.transaction_count, false);
            let kept = rule_keys(&result.rules);
            for rule in all.iter() {
                if !kept.contains(&(rule.antecedent.clone(), rule.consequent.clone())) {
                    prop_assert!(rule.confidence < min_confidence);
                }
            }
        }

        #[test]
        fn runs_are_deterministic_and_parallel_agrees(
            rows in rows_strategy(),
            min_support in 1u64..4,
        ) {
            let params = MiningParams::new(min_support, 0.3).unwrap();
            let first = mine(rows.clone(), &params).unwrap();
            let second = mine(rows.clone(), &params).unwrap();
            let parallel = mine(rows, &params.with_parallel(true)).unwrap();
            prop_assert_eq!(rule_keys(&first.rules), rule_keys(&second.rules));
            prop_assert_eq!(rule_keys(&first.rules), rule_keys(&parallel.rules));
            prop_assert_eq!(&first.frequent_itemsets, &parallel.frequent_itemsets);
        }
    }
}
