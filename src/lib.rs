/// This crate mines frequent itemsets and association rules from transactions.
pub mod miner;
pub mod error;
pub mod ingest;
pub mod cache;
pub mod report;
pub mod config;
pub mod utils;

/// Mining entry point
/// Takes raw transactions (any iterable of iterables of items) and the run
/// thresholds, and returns the complete result or an error.
///
/// The run is a pure function of its inputs: nothing is kept between calls,
/// so concurrent callers never share state.
///
/// # Errors
/// `MinerError::InvalidParameters` when a threshold is out of range.
/// Empty input is not an error; it yields an empty result.
pub use miner::mine;

/// Mining thresholds
/// - `min_support`: absolute occurrence count (`count >= min_support` keeps
///   an itemset). It may be fractional, e.g. percent x transaction count.
/// - `min_confidence`: fraction in [0, 1]
/// - `parallel`: opt-in rayon counting and rule derivation, identical results
pub use miner::MiningParams;

/// Result of one run
/// Holds the frequent itemset sequence, the rules, the number of mined
/// transactions and the parameters used.
///
/// # Serialization
/// Supported. `MiningSnapshot` wraps it with the user-facing thresholds for
/// caching between processes.
pub use miner::MiningResult;

/// Level-wise miner
/// `LevelMiner<I, C>` has the following generic parameters:
/// - `I`: item type (anything implementing `Item`)
/// - `C`: support counting strategy, `BitmapCounter` by default
///
/// Use it directly to pick the counting strategy or to stop after the
/// frequent itemsets.
pub use miner::LevelMiner;

/// Item sets and level tables
/// - `Itemset`: immutable sorted set of items, usable as a map key
/// - `SupportTable`: itemset -> support count for one cardinality
/// - `FrequentItemsets`: the per-cardinality tables of a run, index 0 holding
///   1-itemsets, with a checked `support_of` lookup
pub use miner::itemset::{FrequentItemsets, Item, Itemset, SupportTable};

/// Cleaned transaction list (sorted, de-duplicated, empty rows dropped)
pub use miner::transaction::TransactionSet;

/// Support counting strategies
/// - `BitmapCounter`: inverted item -> transaction bitmap index
/// - `ScanCounter`: direct subset scan
///
/// Both give identical counts; implement `SupportCounter` to plug in another.
pub use miner::counter::{BitmapCounter, ScanCounter, SupportCounter};

/// Candidate generation: every k-subset of the previous level's items
pub use miner::candidate::generate_candidates;

/// Rules and rule derivation
/// `Rule` carries support, confidence and lift as raw fractions.
/// `RuleList` offers sorting by confidence, lift or support.
pub use miner::rules::{generate_rules, Rule, RuleList};

/// Serializable snapshot for result caching
pub use miner::serde::MiningSnapshot;

pub use error::{MinerError, MinerResult};
