//! Command line / environment configuration for the `dhp-miner` binary

use std::{env, path::PathBuf};

use crate::{
    error::{MinerError, MinerResult},
    ingest::{parse_date, DateRange, IngestOptions},
};

pub const CACHE_FILE_ENV: &str = "DHP_CACHE_FILE";
pub const LOG_ENV: &str = "DHP_LOG";
pub const DEFAULT_CACHE_FILE: &str = "dhp_model.cbor";

/// Settings for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// transactions file, `None` shows the cached result
    pub input: Option<PathBuf>,
    pub ingest: IngestOptions,
    /// percent of transactions
    pub min_support_percent: f64,
    /// percent
    pub min_confidence_percent: f64,
    pub cache_file: PathBuf,
    pub parallel: bool,
    /// rules to print, all when `None`
    pub top: Option<usize>,
    pub help: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: None,
            ingest: IngestOptions {
                date_column: true,
                range: None,
            },
            min_support_percent: 10.0,
            min_confidence_percent: 50.0,
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            parallel: false,
            top: None,
            help: false,
        }
    }
}

impl RunConfig {
    /// Parse process arguments and environment
    pub fn load() -> MinerResult<Self> {
        Self::from_args(env::args().skip(1), |key| env::var(key).ok())
    }

    /// Parse `args` (program name excluded), `env` looks up fallbacks
    pub fn from_args<A, E>(args: A, env: E) -> MinerResult<Self>
    where
        A: IntoIterator<Item = String>,
        E: Fn(&str) -> Option<String>,
    {
        let mut cfg = RunConfig::default();
        if let Some(path) = env(CACHE_FILE_ENV) {
            cfg.cache_file = PathBuf::from(path);
        }
        let mut start = None;
        let mut end = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--input" | "-i" => cfg.input = Some(PathBuf::from(value(&mut args, &arg)?)),
                "--start" => start = Some(parse_date(&value(&mut args, &arg)?)?),
                "--end" => end = Some(parse_date(&value(&mut args, &arg)?)?),
                "--min-support" => {
                    cfg.min_support_percent = percent(&value(&mut args, &arg)?, &arg)?
                }
                "--min-confidence" => {
                    cfg.min_confidence_percent = percent(&value(&mut args, &arg)?, &arg)?
                }
                "--cache" => cfg.cache_file = PathBuf::from(value(&mut args, &arg)?),
                "--no-date-column" => cfg.ingest.date_column = false,
                "--parallel" => cfg.parallel = true,
                "--top" => {
                    let v = value(&mut args, &arg)?;
                    let top = v.parse().map_err(|_| {
                        MinerError::config(format!("--top needs a number, got `{v}`"))
                    })?;
                    cfg.top = Some(top);
                }
                "-h" | "--help" => cfg.help = true,
                other if cfg.input.is_none() && !other.starts_with('-') => {
                    cfg.input = Some(PathBuf::from(other));
                }
                other => return Err(MinerError::config(format!("unknown argument `{other}`"))),
            }
        }

        cfg.ingest.range = match (start, end) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)?),
            (None, None) => None,
            _ => return Err(MinerError::config("--start and --end must be given together")),
        };
        if cfg.ingest.range.is_some() && !cfg.ingest.date_column {
            return Err(MinerError::config("a date range needs the date column"));
        }
        Ok(cfg)
    }

    /// minimum confidence as a fraction
    pub fn min_confidence(&self) -> f64 {
        self.min_confidence_percent / 100.0
    }
}

fn value<A: Iterator<Item = String>>(args: &mut A, flag: &str) -> MinerResult<String> {
    args.next()
        .ok_or_else(|| MinerError::config(format!("{flag} requires a value")))
}

fn percent(v: &str, flag: &str) -> MinerResult<f64> {
    let p: f64 = v
        .trim_end_matches('%')
        .parse()
        .map_err(|_| MinerError::config(format!("{flag} needs a percentage, got `{v}`")))?;
    if !(0.0..=100.0).contains(&p) {
        return Err(MinerError::config(format!("{flag} must be within 0..=100, got {p}")));
    }
    Ok(p)
}

pub fn usage() -> &'static str {
    "Usage: dhp-miner [--input FILE] [--start DATE --end DATE] [--min-support PCT] \
     [--min-confidence PCT] [--cache FILE] [--no-date-column] [--parallel] [--top N]\n\
     Without --input the cached result is shown. Log filter: DHP_LOG (default info)."
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults() {
        let cfg = RunConfig::from_args(Vec::new(), no_env).unwrap();
        assert_eq!(cfg, RunConfig::default());
        assert_eq!(cfg.cache_file, PathBuf::from(DEFAULT_CACHE_FILE));
        assert!((cfg.min_confidence() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn full_argument_set() {
        let cfg = RunConfig::from_args(
            args(&[
                "--input", "sales.csv", "--start", "2024-01-01", "--end", "2024-03-31",
                "--min-support", "2.5", "--min-confidence", "60%", "--parallel", "--top", "15",
            ]),
            no_env,
        )
        .unwrap();
        assert_eq!(cfg.input, Some(PathBuf::from("sales.csv")));
        let range = cfg.ingest.range.unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert_eq!(cfg.min_support_percent, 2.5);
        assert_eq!(cfg.min_confidence_percent, 60.0);
        assert!(cfg.parallel);
        assert_eq!(cfg.top, Some(15));
    }

    #[test]
    fn env_supplies_cache_file_and_flag_wins() {
        let env = |key: &str| (key == CACHE_FILE_ENV).then(|| "from_env.cbor".to_string());
        let cfg = RunConfig::from_args(Vec::new(), env).unwrap();
        assert_eq!(cfg.cache_file, PathBuf::from("from_env.cbor"));

        let cfg = RunConfig::from_args(args(&["--cache", "flag.cbor"]), env).unwrap();
        assert_eq!(cfg.cache_file, PathBuf::from("flag.cbor"));
    }

    #[test]
    fn positional_input() {
        let cfg = RunConfig::from_args(args(&["baskets.csv", "--no-date-column"]), no_env).unwrap();
        assert_eq!(cfg.input, Some(PathBuf::from("baskets.csv")));
        assert!(!cfg.ingest.date_column);
    }

    #[test]
    fn bad_arguments() {
        assert!(RunConfig::from_args(args(&["--min-support"]), no_env).is_err());
        assert!(RunConfig::from_args(args(&["--min-support", "abc"]), no_env).is_err());
        assert!(RunConfig::from_args(args(&["--min-confidence", "120"]), no_env).is_err());
        assert!(RunConfig::from_args(args(&["--start", "2024-01-01"]), no_env).is_err());
        assert!(RunConfig::from_args(args(&["--bogus"]), no_env).is_err());
        assert!(RunConfig::from_args(
            args(&["--no-date-column", "--start", "2024-01-01", "--end", "2024-01-02"]),
            no_env
        )
        .is_err());
    }
}
