//! Snapshot persistence between runs (CBOR file)

use std::{
    fs::{self, File},
    hash::Hash,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::{error::MinerResult, miner::serde::MiningSnapshot};

/// Write `snapshot` to `path`
/// The bytes go to a sibling temp file first and are renamed into place, so a
/// crash never leaves a half-written cache behind.
pub fn save<I>(path: impl AsRef<Path>, snapshot: &MiningSnapshot<I>) -> MinerResult<()>
where
    I: Serialize,
{
    let path = path.as_ref();
    let tmp = temp_path(path);
    if let Err(err) = write_to(&tmp, snapshot) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), "snapshot saved");
    Ok(())
}

/// Read a snapshot, `Ok(None)` when nothing was saved yet
pub fn load<I>(path: impl AsRef<Path>) -> MinerResult<Option<MiningSnapshot<I>>>
where
    I: DeserializeOwned + Ord + Hash,
{
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no snapshot on disk");
        return Ok(None);
    }
    let reader = BufReader::new(File::open(path)?);
    let snapshot = serde_cbor::from_reader(reader)?;
    Ok(Some(snapshot))
}

fn write_to<I: Serialize>(tmp: &Path, snapshot: &MiningSnapshot<I>) -> MinerResult<()> {
    let mut writer = BufWriter::new(File::create(tmp)?);
    serde_cbor::to_writer(&mut writer, snapshot)?;
    writer.flush()?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
