use crate::miner::itemset::{Item, Itemset, SupportTable};

/// Cleaned transaction list
/// Each transaction is sorted and de-duplicated, empty transactions are dropped.
/// The position in the list is the transaction id.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSet<I> {
    transactions: Vec<Box<[I]>>,
}

impl<I: Item> TransactionSet<I> {
    pub fn new<T, R>(rows: T) -> Self
    where
        T: IntoIterator<Item = R>,
        R: IntoIterator<Item = I>,
    {
        let transactions = rows
            .into_iter()
            .filter_map(|row| {
                let mut items: Vec<I> = row.into_iter().collect();
                items.sort_unstable();
                items.dedup();
                if items.is_empty() {
                    None
                } else {
                    Some(items.into_boxed_slice())
                }
            })
            .collect();
        Self { transactions }
    }

    /// Single-item support counts, counted straight from the transactions
    pub fn item_counts(&self) -> SupportTable<I> {
        let mut table = SupportTable::new(1);
        for transaction in &self.transactions {
            for item in transaction.iter() {
                table.increment(Itemset::from_sorted_unchecked(vec![item.clone()]));
            }
        }
        table
    }
}

impl<I> TransactionSet<I> {
    /// number of (non-empty) transactions
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// the transactions with their id
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[I])> {
        self.transactions.iter().map(|t| &**t).enumerate()
    }

    pub fn as_slice(&self) -> &[Box<[I]>] {
        &self.transactions
    }

    /// size of the longest transaction
    pub fn max_len(&self) -> usize {
        self.transactions.iter().map(|t| t.len()).max().unwrap_or(0)
    }
}

impl<I: Item> FromIterator<Vec<I>> for TransactionSet<I> {
    fn from_iter<T: IntoIterator<Item = Vec<I>>>(iter: T) -> Self {
        Self::new(iter)
    }
}
