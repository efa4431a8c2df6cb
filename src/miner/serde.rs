use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::miner::{itemset::Item, MiningResult};

/// Serializable record of a finished run
/// Holds the result together with the user-facing thresholds (in percent)
/// that produced it, so a later process can show both without re-mining.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "I: Serialize",
    deserialize = "I: Deserialize<'de> + Ord + Hash"
))]
pub struct MiningSnapshot<I> {
    pub result: MiningResult<I>,
    /// minimum support as entered, percent of transactions
    pub min_support_percent: Option<f64>,
    /// minimum confidence as entered, percent
    pub min_confidence_percent: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl<I: Eq + Hash> PartialEq for MiningSnapshot<I> {
    fn eq(&self, other: &Self) -> bool {
        self.result == other.result
            && self.min_support_percent == other.min_support_percent
            && self.min_confidence_percent == other.min_confidence_percent
            && self.created_at == other.created_at
    }
}

impl<I: Item> MiningSnapshot<I> {
    pub fn new(result: MiningResult<I>) -> Self {
        Self {
            result,
            min_support_percent: None,
            min_confidence_percent: None,
            created_at: Utc::now(),
        }
    }

    /// record the percent thresholds given by the user
    pub fn with_percents(mut self, min_support_percent: f64, min_confidence_percent: f64) -> Self {
        self.min_support_percent = Some(min_support_percent);
        self.min_confidence_percent = Some(min_confidence_percent);
        self
    }

    pub fn into_result(self) -> MiningResult<I> {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::{mine, MiningParams};

    #[test]
    fn snapshot_round_trips_through_cbor() {
        let rows = vec![
            vec!["milk".to_string(), "bread".to_string()],
            vec!["milk".to_string(), "bread".to_string(), "eggs".to_string()],
            vec!["milk".to_string()],
        ];
        let params = MiningParams::new(2, 0.5).unwrap();
        let result = mine(rows, &params).unwrap();
        let snapshot = MiningSnapshot::new(result).with_percents(50.0, 50.0);

        let bytes = serde_cbor::to_vec(&snapshot).unwrap();
        let back: MiningSnapshot<String> = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.min_support_percent, Some(50.0));
        assert_eq!(back.result.params, params);
    }
}
