//! Generic HFS+ B-tree search.
//!
//! A B-tree file is an array of fixed-size nodes laid over the fork's linear
//! bytes; node `n` starts at byte `n * node_size`. Node 0 is the header node,
//! whose first record names the root node and the node size.
//!
//! ```text
//! +----------------------+  0
//! | BTNodeDescriptor     |
//! +----------------------+  14   <- record 0 always starts here
//! | record 0 | record 1  |
//! | ...                  |
//! +----------------------+
//! | free space           |
//! +----------------------+
//! | off[n] ... off[1] off[0] |  <- u16 offsets, read back to front
//! +----------------------+  node_size
//! ```
//!
//! Keys are compared in their on-disk form: the engine hands each
//! [`TrialKey`] to a caller-supplied comparator and never decodes keys itself,
//! so the same search serves any keyed B-tree.

use crate::device::BlockDevice;
use crate::error::{Error, Result};
use crate::raw::{be_u16, be_u32};
use crate::{BTreeHeaderRecord, BTreeNodeDescriptor, ExtentRecord, ForkData, fork};
use deku::DekuContainerRead;
use hfs_types_rs::{BTreeNodeType, CatalogNodeId, MAX_NODE_SIZE, MIN_NODE_SIZE};
use std::cmp::Ordering;

/// Deeper than any legal HFS+ tree; guards against child pointer cycles.
const MAX_DEPTH: usize = 16;

/// Handle on one of the volume's special B-tree files.
#[derive(Debug, Clone)]
pub struct BTreeFile {
    pub id: CatalogNodeId,
    pub logical_size: u64,
    pub extents: ExtentRecord,
    pub root_node: u32,
    pub node_size: u16,
    /// Node count from the header record; bounds any walk along sibling links.
    pub total_nodes: u32,
}

impl BTreeFile {
    /// Read the header record of node 0 to learn the root node and node size.
    pub fn setup<D: BlockDevice + ?Sized>(
        device: &D,
        id: CatalogNodeId,
        fork_data: &ForkData,
    ) -> Result<Self> {
        let mut raw = [0u8; BTreeHeaderRecord::SIZE];
        fork::read_at(
            device,
            &fork_data.extents,
            fork_data.logical_size,
            BTreeNodeDescriptor::SIZE as u64,
            &mut raw,
        )?;
        let (_rest, header) = BTreeHeaderRecord::from_bytes((&raw, 0))?;

        let node_size = header.node_size;
        if !node_size.is_power_of_two() || !(MIN_NODE_SIZE..=MAX_NODE_SIZE).contains(&node_size) {
            return Err(Error::corrupted(format!("invalid B-tree node size {node_size}")));
        }

        log::debug!(
            "B-tree {id}: root node {}, node size {node_size}, depth {}, {} nodes",
            header.root_node,
            header.tree_depth,
            header.total_nodes
        );

        Ok(Self {
            id,
            logical_size: fork_data.logical_size,
            extents: fork_data.extents,
            root_node: header.root_node,
            node_size,
            total_nodes: header.total_nodes,
        })
    }

    /// Load node `number` into a freshly allocated buffer and check that
    /// record 0 sits right after the node descriptor.
    pub fn read_node<D: BlockDevice + ?Sized>(&self, device: &D, number: u32) -> Result<Node> {
        let size = usize::from(self.node_size);
        let mut data = Vec::new();
        data.try_reserve_exact(size).map_err(|_| Error::OutOfMemory)?;
        data.resize(size, 0);

        let pos = u64::from(number) * u64::from(self.node_size);
        fork::read_at(device, &self.extents, self.logical_size, pos, &mut data)?;

        log::trace!("B-tree {}: loaded node {number}", self.id);
        Node::new(number, data)
    }

    /// Search for `search_key`, then step forward over `skip` further records,
    /// following sibling links as needed.
    ///
    /// `compare(trial, search_key)` orders a trial key against the search key.
    /// On an index node an equal result means "descend here"; only an equal
    /// result on a leaf node is a hit.
    pub fn search<D, K, C>(
        &self,
        device: &D,
        search_key: &K,
        compare: C,
        skip: u64,
    ) -> Result<SearchHit>
    where
        D: BlockDevice + ?Sized,
        K: ?Sized,
        C: Fn(&TrialKey<'_>, &K) -> Result<Ordering>,
    {
        if self.root_node == 0 {
            return Err(Error::NotFound);
        }

        let mut number = self.root_node;
        for _ in 0..MAX_DEPTH {
            let node = self.read_node(device, number)?;
            let kind = node.kind()?;
            let count = node.record_count();

            match (kind, count) {
                (BTreeNodeType::Header | BTreeNodeType::Map, _) => {
                    return Err(Error::corrupted(format!("search reached {kind:?} node {number}")));
                }
                (BTreeNodeType::Index, 0) => {
                    return Err(Error::corrupted(format!("empty index node {number}")));
                }
                (BTreeNodeType::Leaf, 0) => return Err(Error::NotFound),
                _ => {}
            }

            let mut lo = 0i32;
            let mut hi = i32::from(count) - 1;
            while lo <= hi {
                let mid = (lo + hi) / 2;
                let trial = node.trial_key(mid as u16)?;
                match compare(&trial, search_key)? {
                    Ordering::Less => lo = mid + 1,
                    Ordering::Greater => hi = mid - 1,
                    Ordering::Equal if kind != BTreeNodeType::Leaf => {
                        hi = mid;
                        break;
                    }
                    Ordering::Equal => return self.skip_forward(device, node, mid as u16, skip),
                }
            }

            // `hi` is now the record with the largest key not above the search key.
            if kind != BTreeNodeType::Index || hi < 0 {
                return Err(Error::NotFound);
            }

            number = node.trial_key(hi as u16)?.child_node()?;
            log::trace!("B-tree {}: descending to node {number}", self.id);
        }

        Err(Error::corrupted(format!("B-tree {} deeper than {MAX_DEPTH} levels", self.id)))
    }

    fn skip_forward<D: BlockDevice + ?Sized>(
        &self,
        device: &D,
        mut node: Node,
        mut record: u16,
        mut skip: u64,
    ) -> Result<SearchHit> {
        let mut hops = 0u32;
        loop {
            let remaining = u64::from(node.record_count().saturating_sub(record));
            if skip < remaining {
                break;
            }
            skip -= remaining;
            record = 0;

            let next = node.forward_link();
            if next == 0 {
                return Err(Error::NotFound);
            }
            if next == node.number() {
                return Err(Error::corrupted(format!("leaf node {next} links to itself")));
            }

            hops += 1;
            if hops >= self.total_nodes {
                return Err(Error::corrupted(format!(
                    "B-tree {}: sibling chain longer than its {} nodes",
                    self.id, self.total_nodes
                )));
            }

            node = self.read_node(device, next)?;
            if node.kind()? != BTreeNodeType::Leaf {
                return Err(Error::corrupted(format!("sibling link to non-leaf node {next}")));
            }
            if node.record_count() == 0 {
                return Err(Error::corrupted(format!("empty leaf node {next} in sibling chain")));
            }
        }

        // skip < remaining, so the sum stays within the node's records.
        let record = record + skip as u16;
        Ok(SearchHit { node, record })
    }
}

/// One node's bytes, validated for the record-0 invariant.
#[derive(Debug)]
pub struct Node {
    number: u32,
    descriptor: BTreeNodeDescriptor,
    data: Vec<u8>,
}

impl Node {
    pub fn new(number: u32, data: Vec<u8>) -> Result<Self> {
        let (_, descriptor) = BTreeNodeDescriptor::from_bytes((data.as_slice(), 0))?;
        let node = Self {
            number,
            descriptor,
            data,
        };

        if node.offset(0)? != BTreeNodeDescriptor::SIZE {
            return Err(Error::corrupted(format!(
                "node {number}: record 0 does not follow the node descriptor"
            )));
        }

        Ok(node)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn kind(&self) -> Result<BTreeNodeType> {
        BTreeNodeType::try_from(self.descriptor.kind)
            .map_err(|kind| Error::corrupted(format!("node {}: unknown kind {kind}", self.number)))
    }

    pub fn record_count(&self) -> u16 {
        self.descriptor.num_records
    }

    pub fn forward_link(&self) -> u32 {
        self.descriptor.forward_link
    }

    /// Entry `index` of the offset table. Index `record_count()` is the
    /// free-space sentinel.
    fn offset(&self, index: u16) -> Result<usize> {
        let slot = self
            .data
            .len()
            .checked_sub(2 * (usize::from(index) + 1))
            .filter(|&slot| slot >= BTreeNodeDescriptor::SIZE)
            .ok_or_else(|| self.corrupted("offset table overruns the node"))?;

        let offset = be_u16(&self.data, slot).ok_or_else(|| self.corrupted("offset table overruns the node"))?;
        let offset = usize::from(offset);
        if offset < BTreeNodeDescriptor::SIZE || offset > slot {
            return Err(self.corrupted("record offset outside the record area"));
        }

        Ok(offset)
    }

    /// Bytes of record `index`, bounded by the next record's offset.
    pub fn record(&self, index: u16) -> Result<&[u8]> {
        if index >= self.record_count() {
            return Err(self.corrupted("record index past record count"));
        }

        let start = self.offset(index)?;
        let end = self.offset(index + 1)?;
        if end < start {
            return Err(self.corrupted("record offsets out of order"));
        }

        Ok(&self.data[start..end])
    }

    pub fn trial_key(&self, index: u16) -> Result<TrialKey<'_>> {
        TrialKey::new(self.record(index)?)
    }

    fn corrupted(&self, detail: &str) -> Error {
        Error::corrupted(format!("node {}: {detail}", self.number))
    }
}

/// The key at the start of a record, still in on-disk byte order.
#[derive(Debug, Clone, Copy)]
pub struct TrialKey<'a> {
    key: &'a [u8],
    data: &'a [u8],
}

impl<'a> TrialKey<'a> {
    /// Split a record into its `keyLength`-prefixed key and the data behind it.
    pub fn new(record: &'a [u8]) -> Result<Self> {
        let key_length = be_u16(record, 0)
            .ok_or_else(|| Error::corrupted("record too short for a key length"))?;
        let end = 2 + usize::from(key_length);
        if end > record.len() {
            return Err(Error::corrupted("key length overruns its record"));
        }

        Ok(Self {
            key: &record[2..end],
            data: &record[end..],
        })
    }

    /// Key bytes after the length prefix, big-endian.
    pub fn key(&self) -> &'a [u8] {
        self.key
    }

    /// Record payload following the key.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Child node number carried by an index record.
    pub fn child_node(&self) -> Result<u32> {
        be_u32(self.data, 0).ok_or_else(|| Error::corrupted("index record without a child pointer"))
    }
}

/// A successful search: the node buffer holding the hit and the record index.
#[derive(Debug)]
pub struct SearchHit {
    node: Node,
    record: u16,
}

impl SearchHit {
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn record_index(&self) -> u16 {
        self.record
    }

    pub fn trial_key(&self) -> Result<TrialKey<'_>> {
        self.node.trial_key(self.record)
    }
}
