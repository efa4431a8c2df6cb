//! Human readable rendering of mining results

use std::fmt::{self, Display};

use crate::miner::{
    itemset::{FrequentItemsets, Item, Itemset},
    rules::{Rule, RuleList},
    MiningResult,
};

pub const DEFAULT_PRECISION: usize = 2;

/// `0.6667` -> `"66.67%"` at precision 2
pub fn format_percent(fraction: f64, precision: usize) -> String {
    format!("{:.*}%", precision, fraction * 100.0)
}

impl<I: Display> Display for Itemset<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        write!(f, "}}")
    }
}

impl<I: Display> Display for Rule<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(DEFAULT_PRECISION);
        write!(
            f,
            "{} => {} (support {}, confidence {}, lift {:.*})",
            self.antecedent,
            self.consequent,
            format_percent(self.support, precision),
            format_percent(self.confidence, precision),
            precision,
            self.lift
        )
    }
}

impl<I: Display> Display for RuleList<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(DEFAULT_PRECISION);
        for rule in self.iter() {
            writeln!(f, "{rule:.precision$}")?;
        }
        Ok(())
    }
}

/// Text report over a whole result
/// Frequent itemsets are listed per level with their support fraction, rules
/// follow sorted by confidence.
pub struct Report<'a, I> {
    result: &'a MiningResult<I>,
    precision: usize,
    top: Option<usize>,
}

impl<'a, I: Item + Display> Report<'a, I> {
    pub fn new(result: &'a MiningResult<I>) -> Self {
        Self {
            result,
            precision: DEFAULT_PRECISION,
            top: None,
        }
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// print at most `top` rules
    pub fn top(mut self, top: Option<usize>) -> Self {
        self.top = top;
        self
    }

    fn write_itemsets(
        &self,
        f: &mut fmt::Formatter<'_>,
        frequent: &FrequentItemsets<I>,
    ) -> fmt::Result {
        let n = self.result.transaction_count as f64;
        for table in frequent.levels() {
            writeln!(f, "Frequent {}-itemsets ({}):", table.cardinality(), table.len())?;
            let mut entries: Vec<(&Itemset<I>, u64)> = table.iter().map(|(s, &c)| (s, c)).collect();
            entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            for (set, count) in entries {
                let support = format_percent(count as f64 / n, self.precision);
                writeln!(f, "  {set}  count {count}  support {support}")?;
            }
        }
        Ok(())
    }
}

impl<I: Item + Display> Display for Report<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        writeln!(
            f,
            "{} transactions, min support {} (count), min confidence {}",
            result.transaction_count,
            result.params.min_support(),
            format_percent(result.params.min_confidence(), self.precision)
        )?;
        if result.frequent_itemsets.is_empty() {
            writeln!(f, "No frequent itemsets.")?;
            return Ok(());
        }
        self.write_itemsets(f, &result.frequent_itemsets)?;

        let mut rules = result.rules.clone();
        rules.sort_by_confidence();
        if let Some(top) = self.top {
            rules.truncate(top);
        }
        writeln!(f, "Rules ({} of {}):", rules.len(), result.rules.len())?;
        write!(f, "{:.*}", self.precision, rules)
    }
}
