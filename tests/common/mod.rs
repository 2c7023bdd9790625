//! A small synthetic HFS+ image built in memory.
//!
//! ```text
//! block 0    volume header at byte 1024
//! block 1-4  catalog nodes: 0 header, 1 index, 2 and 3 sibling leaves
//! block 5    Beta.txt, second block
//! block 6    Beta.txt, first block
//! block 7    symlink target "alpha/inner.txt"
//! block 8    alpha/inner.txt
//! ```
//!
//! Root (2) holds `alpha/` (16), `Beta.txt` (17), `gamma/` (18), the hard
//! link `hard` (19, inode 42) and the symlink `link` (20). `alpha/` holds
//! `inner.txt` (21).

#![allow(dead_code)]

use hfsplus_ro::{BlockDevice, HfsPlusVolume, ImageDevice};
use std::cell::RefCell;
use std::io::{self, Cursor};
use std::rc::Rc;

pub const BLOCK_SIZE: usize = 4096;
pub const TOTAL_BLOCKS: u32 = 16;
pub const FREE_BLOCKS: u32 = 7;
pub const HFS_EPOCH_1970: u32 = 2_082_844_800;

pub const ROOT_ID: u32 = 2;
pub const ALPHA_ID: u32 = 16;
pub const BETA_ID: u32 = 17;
pub const GAMMA_ID: u32 = 18;
pub const HARD_ID: u32 = 19;
pub const LINK_ID: u32 = 20;
pub const INNER_ID: u32 = 21;

pub const HARD_LINK_INODE: u32 = 42;
pub const SYMLINK_TARGET: &[u8] = b"alpha/inner.txt";
pub const INNER_CONTENTS: &[u8] = b"inner contents\n";
pub const BETA_SIZE: usize = 5000;

const CATALOG_START_BLOCK: u32 = 1;
const CATALOG_NODES: u32 = 4;

const FOLDER: u16 = 1;
const FILE: u16 = 2;
const FOLDER_THREAD: u16 = 3;

pub type TestVolume = HfsPlusVolume<ImageDevice<Cursor<Vec<u8>>>>;

/// Knobs for building deliberately broken images.
#[derive(Debug, Clone)]
pub struct Options {
    pub signature: u16,
    pub block_size: u32,
    pub total_blocks: u32,
    pub node_size: u16,
    pub root_node: u32,
    pub symlink_size: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            signature: u16::from_be_bytes(*b"H+"),
            block_size: BLOCK_SIZE as u32,
            total_blocks: TOTAL_BLOCKS,
            node_size: BLOCK_SIZE as u16,
            root_node: 1,
            symlink_size: SYMLINK_TARGET.len() as u64,
        }
    }
}

pub fn beta_contents() -> Vec<u8> {
    (0..BETA_SIZE).map(|i| (i % 251) as u8).collect()
}

/// Byte offset of catalog node `n` in the image.
pub fn node_start(n: u32) -> usize {
    (CATALOG_START_BLOCK + n) as usize * BLOCK_SIZE
}

pub fn image() -> Vec<u8> {
    build(&Options::default())
}

pub fn mount() -> TestVolume {
    HfsPlusVolume::mount(ImageDevice::new(Cursor::new(image()))).unwrap()
}

pub fn mount_image(image: Vec<u8>) -> hfsplus_ro::Result<TestVolume> {
    HfsPlusVolume::mount(ImageDevice::new(Cursor::new(image)))
}

pub fn utf16(name: &str) -> Vec<u16> {
    name.encode_utf16().collect()
}

pub fn build(opts: &Options) -> Vec<u8> {
    let mut image = vec![0u8; TOTAL_BLOCKS as usize * BLOCK_SIZE];

    image[1024..1024 + 512].copy_from_slice(&volume_header(opts));

    for (n, node) in [header_node(opts), index_node(), first_leaf(), second_leaf(opts)]
        .into_iter()
        .enumerate()
    {
        let start = node_start(n as u32);
        image[start..start + BLOCK_SIZE].copy_from_slice(&node);
    }

    let beta = beta_contents();
    image[6 * BLOCK_SIZE..7 * BLOCK_SIZE].copy_from_slice(&beta[..BLOCK_SIZE]);
    image[5 * BLOCK_SIZE..5 * BLOCK_SIZE + (BETA_SIZE - BLOCK_SIZE)]
        .copy_from_slice(&beta[BLOCK_SIZE..]);
    image[7 * BLOCK_SIZE..7 * BLOCK_SIZE + SYMLINK_TARGET.len()].copy_from_slice(SYMLINK_TARGET);
    image[8 * BLOCK_SIZE..8 * BLOCK_SIZE + INNER_CONTENTS.len()].copy_from_slice(INNER_CONTENTS);

    image
}

fn put_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_be_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_be_bytes());
}

fn put_u64(buf: &mut [u8], at: usize, value: u64) {
    buf[at..at + 8].copy_from_slice(&value.to_be_bytes());
}

/// HFSPlusForkData with up to eight (start, count) extents.
fn fork_data(logical_size: u64, extents: &[(u32, u32)]) -> [u8; 80] {
    let mut fork = [0u8; 80];
    put_u64(&mut fork, 0, logical_size);
    put_u32(&mut fork, 12, extents.iter().map(|&(_, count)| count).sum());
    for (i, &(start, count)) in extents.iter().enumerate() {
        put_u32(&mut fork, 16 + 8 * i, start);
        put_u32(&mut fork, 20 + 8 * i, count);
    }
    fork
}

fn volume_header(opts: &Options) -> [u8; 512] {
    let mut header = [0u8; 512];
    put_u16(&mut header, 0, opts.signature);
    put_u16(&mut header, 2, 4);
    put_u32(&mut header, 20, HFS_EPOCH_1970 + 5000);
    put_u32(&mut header, 32, 4);
    put_u32(&mut header, 36, 3);
    put_u32(&mut header, 40, opts.block_size);
    put_u32(&mut header, 44, opts.total_blocks);
    put_u32(&mut header, 48, FREE_BLOCKS);
    put_u32(&mut header, 64, 22);

    let catalog = fork_data(
        u64::from(CATALOG_NODES) * BLOCK_SIZE as u64,
        &[(CATALOG_START_BLOCK, CATALOG_NODES)],
    );
    header[272..352].copy_from_slice(&catalog);
    header
}

/// Lay out a node: descriptor, packed records, offset table at the end.
fn node(kind: i8, height: u8, b_link: u32, f_link: u32, records: &[Vec<u8>]) -> Vec<u8> {
    let mut data = vec![0u8; BLOCK_SIZE];
    put_u32(&mut data, 0, f_link);
    put_u32(&mut data, 4, b_link);
    data[8] = kind as u8;
    data[9] = height;
    put_u16(&mut data, 10, records.len() as u16);

    let mut offset = 14;
    for (i, record) in records.iter().enumerate() {
        data[offset..offset + record.len()].copy_from_slice(record);
        put_u16(&mut data, BLOCK_SIZE - 2 * (i + 1), offset as u16);
        offset += record.len();
    }
    put_u16(&mut data, BLOCK_SIZE - 2 * (records.len() + 1), offset as u16);
    data
}

fn header_node(opts: &Options) -> Vec<u8> {
    let mut header = vec![0u8; 106];
    put_u16(&mut header, 0, 2);
    put_u32(&mut header, 2, opts.root_node);
    put_u32(&mut header, 6, 10);
    put_u32(&mut header, 10, 2);
    put_u32(&mut header, 14, 3);
    put_u16(&mut header, 18, opts.node_size);
    put_u16(&mut header, 20, 516);
    put_u32(&mut header, 22, CATALOG_NODES);
    put_u32(&mut header, 32, BLOCK_SIZE as u32);
    header[37] = 0xCF;
    put_u32(&mut header, 38, 6);

    let user = vec![0u8; 128];
    let mut map = vec![0u8; 256];
    map[0] = 0xF0;

    node(1, 0, 0, 0, &[header, user, map])
}

fn key(parent: u32, name: &str) -> Vec<u8> {
    let units = utf16(name);
    let mut out = Vec::new();
    out.extend_from_slice(&(6 + 2 * units.len() as u16).to_be_bytes());
    out.extend_from_slice(&parent.to_be_bytes());
    out.extend_from_slice(&(units.len() as u16).to_be_bytes());
    for unit in units {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

fn index_record(parent: u32, name: &str, child: u32) -> Vec<u8> {
    let mut record = key(parent, name);
    record.extend_from_slice(&child.to_be_bytes());
    record
}

fn index_node() -> Vec<u8> {
    node(
        0,
        2,
        0,
        0,
        &[index_record(1, "Volume", 2), index_record(ROOT_ID, "gamma", 3)],
    )
}

/// (create, content modified, accessed) in HFS+ time.
type Dates = (u32, u32, u32);

fn folder(parent: u32, name: &str, id: u32, dates: Dates) -> Vec<u8> {
    let mut data = [0u8; 88];
    put_u16(&mut data, 0, FOLDER);
    put_u32(&mut data, 8, id);
    put_u32(&mut data, 12, dates.0);
    put_u32(&mut data, 16, dates.1);
    put_u32(&mut data, 24, dates.2);

    let mut record = key(parent, name);
    record.extend_from_slice(&data);
    record
}

struct FileSpec<'a> {
    id: u32,
    dates: Dates,
    file_type: &'a [u8; 4],
    creator: &'a [u8; 4],
    special: u32,
    data_fork: [u8; 80],
}

fn file(parent: u32, name: &str, spec: FileSpec<'_>) -> Vec<u8> {
    let mut data = [0u8; 248];
    put_u16(&mut data, 0, FILE);
    put_u32(&mut data, 8, spec.id);
    put_u32(&mut data, 12, spec.dates.0);
    put_u32(&mut data, 16, spec.dates.1);
    put_u32(&mut data, 24, spec.dates.2);
    put_u32(&mut data, 44, spec.special);
    data[48..52].copy_from_slice(spec.file_type);
    data[52..56].copy_from_slice(spec.creator);
    data[88..168].copy_from_slice(&spec.data_fork);

    let mut record = key(parent, name);
    record.extend_from_slice(&data);
    record
}

fn thread(id: u32, parent: u32, name: &str) -> Vec<u8> {
    let units = utf16(name);
    let mut record = key(id, "");
    record.extend_from_slice(&FOLDER_THREAD.to_be_bytes());
    record.extend_from_slice(&[0, 0]);
    record.extend_from_slice(&parent.to_be_bytes());
    record.extend_from_slice(&(units.len() as u16).to_be_bytes());
    for unit in units {
        record.extend_from_slice(&unit.to_be_bytes());
    }
    record
}

fn first_leaf() -> Vec<u8> {
    let dated = |offset: u32| {
        (
            HFS_EPOCH_1970 + offset,
            HFS_EPOCH_1970 + offset + 100,
            HFS_EPOCH_1970 + offset + 200,
        )
    };

    node(
        -1,
        1,
        0,
        3,
        &[
            folder(1, "Volume", ROOT_ID, dated(0)),
            thread(ROOT_ID, 1, "Volume"),
            folder(ROOT_ID, "alpha", ALPHA_ID, dated(100)),
            file(
                ROOT_ID,
                "Beta.txt",
                FileSpec {
                    id: BETA_ID,
                    dates: dated(1000),
                    file_type: b"TEXT",
                    creator: b"ttxt",
                    special: 0,
                    data_fork: fork_data(BETA_SIZE as u64, &[(6, 1), (5, 1)]),
                },
            ),
        ],
    )
}

fn second_leaf(opts: &Options) -> Vec<u8> {
    node(
        -1,
        1,
        2,
        0,
        &[
            // Dated before 1970.
            folder(ROOT_ID, "gamma", GAMMA_ID, (1000, 2000, 3000)),
            file(
                ROOT_ID,
                "hard",
                FileSpec {
                    id: HARD_ID,
                    dates: (HFS_EPOCH_1970, HFS_EPOCH_1970, HFS_EPOCH_1970),
                    file_type: b"hlnk",
                    creator: b"hfs+",
                    special: HARD_LINK_INODE,
                    data_fork: fork_data(0, &[]),
                },
            ),
            file(
                ROOT_ID,
                "link",
                FileSpec {
                    id: LINK_ID,
                    dates: (HFS_EPOCH_1970, HFS_EPOCH_1970, HFS_EPOCH_1970),
                    file_type: b"slnk",
                    creator: b"rhap",
                    special: 0,
                    data_fork: fork_data(opts.symlink_size, &[(7, 1)]),
                },
            ),
            thread(ALPHA_ID, ROOT_ID, "alpha"),
            file(
                ALPHA_ID,
                "inner.txt",
                FileSpec {
                    id: INNER_ID,
                    dates: (HFS_EPOCH_1970, HFS_EPOCH_1970, HFS_EPOCH_1970),
                    file_type: b"TEXT",
                    creator: b"ttxt",
                    special: 0,
                    data_fork: fork_data(INNER_CONTENTS.len() as u64, &[(8, 1)]),
                },
            ),
            thread(GAMMA_ID, ROOT_ID, "gamma"),
        ],
    )
}

/// Wraps a device and records every block fetched.
pub struct RecordingDevice<D> {
    pub inner: D,
    pub fetched: Rc<RefCell<Vec<u64>>>,
}

impl<D> RecordingDevice<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            fetched: Rc::default(),
        }
    }
}

impl<D: BlockDevice> BlockDevice for RecordingDevice<D> {
    fn set_block_size(&mut self, block_size: u32) {
        self.inner.set_block_size(block_size);
    }

    fn block_size(&self) -> u32 {
        self.inner.block_size()
    }

    fn get(&self, block: u64) -> io::Result<Vec<u8>> {
        self.fetched.borrow_mut().push(block);
        self.inner.get(block)
    }
}
