//! Catalog B-tree keys and records.
//!
//! Catalog keys order by parent CNID first, then by case-folded UTF-16 name.
//! Search keys are built in host byte order; the keys found on disk stay
//! big-endian and are converted field by field while comparing.

use crate::btree::TrialKey;
use crate::error::{Error, Result};
use crate::raw::{be_u16, be_u16_units, be_u32};
use crate::{CatalogFile, CatalogFolder, CatalogThread};
use deku::DekuContainerRead;
use hfs_types_rs::{CatalogNodeId, CatalogRecordType, MAX_NAME_LENGTH};
use std::cmp::Ordering;

/// Host-order catalog search key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogKey {
    pub parent_id: CatalogNodeId,
    pub node_name: Vec<u16>,
}

impl CatalogKey {
    pub fn new(parent_id: CatalogNodeId, node_name: Vec<u16>) -> Self {
        Self {
            parent_id,
            node_name,
        }
    }

    pub fn with_name(parent_id: CatalogNodeId, name: &str) -> Self {
        Self::new(parent_id, name.encode_utf16().collect())
    }

    /// Key with an empty name, which sorts before every child of `parent_id`.
    pub fn first_child(parent_id: CatalogNodeId) -> Self {
        Self::new(parent_id, Vec::new())
    }

    /// Whether the name fits in an on-disk `HFSUniStr255`.
    pub fn is_representable(&self) -> bool {
        self.node_name.len() <= MAX_NAME_LENGTH
    }
}

/// Parent ID and name units of an on-disk catalog key.
#[derive(Debug, Clone, Copy)]
pub struct DiskCatalogKey<'a> {
    pub parent_id: CatalogNodeId,
    name: &'a [u8],
}

impl<'a> DiskCatalogKey<'a> {
    pub fn parse(trial: &TrialKey<'a>) -> Result<Self> {
        let key = trial.key();
        let parent_id = be_u32(key, 0).ok_or_else(|| Error::corrupted("catalog key too short"))?;
        let length = be_u16(key, 4).ok_or_else(|| Error::corrupted("catalog key too short"))?;

        let end = 6 + 2 * usize::from(length);
        let name = key
            .get(6..end)
            .ok_or_else(|| Error::corrupted("catalog key name overruns key"))?;

        Ok(Self { parent_id, name })
    }

    /// Name units converted to host order.
    pub fn name_units(&self) -> impl Iterator<Item = u16> + 'a {
        be_u16_units(self.name)
    }
}

/// Case-fold one UTF-16 unit the way the catalog orders names.
///
/// Only basic Latin capitals and Æ, Ð, Ø, Þ are folded. A literal NUL folds
/// to `0xFFFF` so it never reads as a terminator.
pub fn fold(c: u16) -> u16 {
    match c {
        0 => 0xFFFF,
        0x0041..=0x005A | 0x00C6 | 0x00D0 | 0x00D8 | 0x00DE => c + 0x0020,
        _ => c,
    }
}

/// Next unit that does not fold to zero, or 0 once the name is exhausted.
fn next_folded(units: &mut impl Iterator<Item = u16>) -> u16 {
    units.map(fold).find(|&c| c != 0).unwrap_or(0)
}

/// Order an on-disk trial key against a host-order search key.
pub fn compare(trial: &TrialKey<'_>, search: &CatalogKey) -> Result<Ordering> {
    let disk = DiskCatalogKey::parse(trial)?;

    let ordering = disk.parent_id.cmp(&search.parent_id);
    if ordering != Ordering::Equal {
        return Ok(ordering);
    }

    let mut trial_units = disk.name_units();
    let mut search_units = search.node_name.iter().copied();
    loop {
        let t = next_folded(&mut trial_units);
        let s = next_folded(&mut search_units);

        let ordering = t.cmp(&s);
        if ordering != Ordering::Equal || s == 0 {
            return Ok(ordering);
        }
    }
}

/// A catalog leaf record's payload.
#[derive(Debug, Clone)]
pub enum CatalogRecord {
    Folder(CatalogFolder),
    File(Box<CatalogFile>),
    FolderThread(CatalogThread),
    FileThread(CatalogThread),
    Unknown(u16),
}

impl CatalogRecord {
    /// Decode the record data following a leaf key.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let raw_type =
            be_u16(data, 0).ok_or_else(|| Error::corrupted("catalog record without a type"))?;

        let record = match CatalogRecordType::try_from(raw_type) {
            Ok(CatalogRecordType::Folder) => {
                let (_, folder) = CatalogFolder::from_bytes((data, 0))?;
                CatalogRecord::Folder(folder)
            }
            Ok(CatalogRecordType::File) => {
                let (_, file) = CatalogFile::from_bytes((data, 0))?;
                CatalogRecord::File(Box::new(file))
            }
            Ok(CatalogRecordType::FolderThread) => {
                let (_, thread) = CatalogThread::from_bytes((data, 0))?;
                CatalogRecord::FolderThread(thread)
            }
            Ok(CatalogRecordType::FileThread) => {
                let (_, thread) = CatalogThread::from_bytes((data, 0))?;
                CatalogRecord::FileThread(thread)
            }
            Err(other) => CatalogRecord::Unknown(other),
        };

        Ok(record)
    }

    pub fn record_type(&self) -> u16 {
        match self {
            CatalogRecord::Folder(_) => CatalogRecordType::Folder as u16,
            CatalogRecord::File(_) => CatalogRecordType::File as u16,
            CatalogRecord::FolderThread(_) => CatalogRecordType::FolderThread as u16,
            CatalogRecord::FileThread(_) => CatalogRecordType::FileThread as u16,
            CatalogRecord::Unknown(raw) => *raw,
        }
    }
}
