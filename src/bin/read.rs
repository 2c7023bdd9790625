//! hfsp-read - Inspect an HFS+ disk image without mounting it.
//!
//! Usage:
//!   hfsp-read disk.img info
//!   hfsp-read disk.img ls /Users/shared
//!   hfsp-read -vv disk.img cat /notes.txt > notes.txt

use clap::{Parser, Subcommand};
use hfsplus_ro::dnode::posix_time;
use hfsplus_ro::{
    Dnode, DnodeKind, Error, HfsPlusVolume, ImageDevice, LinkKind, VolumeDriver,
};
use itertools::Itertools;
use log::{LevelFilter, Log, Metadata, Record};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

type Volume = HfsPlusVolume<ImageDevice<BufReader<File>>>;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Parser)]
#[command(name = "hfsp-read")]
#[command(about = "Read files and directories from an HFS+ volume image")]
struct Args {
    /// HFS+ volume image
    image: PathBuf,

    /// More log output; repeat for trace level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Volume header summary and capacity
    Info,
    /// List a directory
    Ls { path: String },
    /// Show a dnode's attributes
    Stat { path: String },
    /// Print a link target
    Readlink { path: String },
    /// Copy a file's data fork to stdout
    Cat { path: String },
    /// SHA-256 of a file's data fork
    Sha256 { path: String },
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:>5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logger(verbose: u8) {
    static LOGGER: StderrLogger = StderrLogger;
    if log::set_logger(&LOGGER).is_err() {
        return;
    }

    log::set_max_level(match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    init_logger(args.verbose);

    let image = File::open(&args.image)?;
    let volume = Volume::mount(ImageDevice::new(BufReader::new(image)))?;

    match args.command {
        Command::Info => info(&volume),
        Command::Ls { path } => ls(&volume, &path),
        Command::Stat { path } => stat(&volume, &path),
        Command::Readlink { path } => {
            let dnode = volume.lookup_path(&path)?;
            let target = volume.readlink(&dnode)?;
            println!("{}", target.escape_ascii());
            Ok(())
        }
        Command::Cat { path } => {
            let dnode = volume.lookup_path(&path)?;
            let mut out = BufWriter::new(io::stdout().lock());
            copy_data(&volume, &dnode, |chunk| out.write_all(chunk))?;
            out.flush()?;
            Ok(())
        }
        Command::Sha256 { path } => {
            let dnode = volume.lookup_path(&path)?;
            let mut hasher = Sha256::new();
            copy_data(&volume, &dnode, |chunk| {
                hasher.update(chunk);
                Ok(())
            })?;
            println!("{:x}  {path}", hasher.finalize());
            Ok(())
        }
    }
}

fn info(volume: &Volume) -> Result<(), Error> {
    let header = volume.header();
    let stat = volume.stat()?;
    let catalog = volume.catalog();

    println!("Driver: {}", Volume::NAME);
    println!("Version: {}", header.version);
    println!("Block Size: {}", header.block_size);
    println!("Files: {}, Folders: {}", header.file_count, header.folder_count);
    println!("Total: {} bytes", stat.total_bytes);
    println!("Free: {} bytes", stat.free_bytes);
    println!("Modified: {}", posix_time(header.modify_date));
    println!("Catalog File:");
    println!("\tlogical_size: {}", catalog.logical_size);
    println!("\tnode_size: {}", catalog.node_size);
    println!("\troot_node: {}", catalog.root_node);
    println!(
        "\textents: {}",
        catalog
            .extents
            .iter()
            .take_while(|extent| extent.block_count != 0)
            .map(|extent| format!("{}+{}", extent.start_block, extent.block_count))
            .join(", ")
    );

    Ok(())
}

fn ls(volume: &Volume, path: &str) -> Result<(), Error> {
    let dir = volume.lookup_path(path)?;
    if !dir.is_dir() {
        return Err(Error::NotFound);
    }

    let mut position = 0u64;
    let mut entries = Vec::new();
    loop {
        match volume.dir_iterate(&dir, &mut position) {
            Ok(entry) => entries.push(entry),
            Err(err) if err.is_not_found() => break,
            Err(err) => return Err(err),
        }
    }

    // Thread records are not directory entries.
    let entries = entries
        .into_iter()
        .filter(|entry| entry.kind != DnodeKind::Unknown)
        .collect_vec();

    for entry in &entries {
        let stat = volume.dno_stat(entry)?;
        println!(
            "{} {:>12} {:>10} {}",
            kind_char(entry),
            stat.used_bytes,
            stat.mtime,
            entry.name_lossy()
        );
    }

    Ok(())
}

fn stat(volume: &Volume, path: &str) -> Result<(), Error> {
    let dnode = volume.lookup_path(path)?;
    let stat = volume.dno_stat(&dnode)?;

    println!("Name: {:?}", dnode.name_lossy());
    println!("ID: {} (parent {})", dnode.id, dnode.parent_id);
    println!("Kind: {:?}", dnode.kind);
    println!("Size: {}", stat.used_bytes);
    println!("Mode: {:o}", stat.mode);
    println!("Times: ctime {} mtime {} atime {}", stat.ctime, stat.mtime, stat.atime);
    if let Some(kind) = dnode.link_kind() {
        println!("Link: {kind:?}");
    }

    Ok(())
}

fn kind_char(dnode: &Dnode) -> char {
    match (dnode.kind, dnode.link_kind()) {
        (DnodeKind::Directory, _) => 'd',
        (DnodeKind::Symlink, Some(LinkKind::Hard)) => 'h',
        (DnodeKind::Symlink, _) => 'l',
        (DnodeKind::File, _) => '-',
        (DnodeKind::Unknown, _) => '?',
    }
}

/// Feed a dnode's data fork to `sink` in chunks.
fn copy_data(
    volume: &Volume,
    dnode: &Dnode,
    mut sink: impl FnMut(&[u8]) -> io::Result<()>,
) -> Result<(), Error> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut pos = 0u64;
    while pos < dnode.size {
        let len = (dnode.size - pos).min(CHUNK_SIZE as u64) as usize;
        volume.read(dnode, pos, &mut buf[..len])?;
        sink(&buf[..len])?;
        pos += len as u64;
    }

    Ok(())
}
