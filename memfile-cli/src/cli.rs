//! Command-line interface for the `memfile` swap-file subsystem.
//!
//! This is a smoke-test harness and worked usage example, not a production
//! tool: each subcommand opens a swap file, drives one or two calls of the
//! programmatic API (§6.2 of the subsystem's design), and prints the
//! resulting state. There is no persistent "session" across invocations
//! beyond what is actually durable on disk — which is exactly the point:
//! it exercises the write-through-to-swap-file contract end to end.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use memfile::{MemFile, OpenFlags, SyncFlags};

/// Smoke-test CLI for the memfile paged swap-file subsystem
#[derive(Parser, Debug)]
#[command(author, version, about = "Drive the memfile API against a real swap file")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print page size, block-number range, and dirty state for a swap file
    Stat {
        /// Path to the swap file
        swapfile: PathBuf,
    },

    /// Allocate a block, fill it from a data file, and flush it to disk
    New {
        /// Path to the swap file (created if it does not exist)
        swapfile: PathBuf,
        /// File whose bytes seed the new block (truncated/zero-padded to
        /// one page)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Allocate the block memory-only (negative number) instead of
        /// assigning it a file offset immediately
        #[arg(long)]
        negative: bool,
        /// Number of pages for the new block
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Overwrite an existing block's contents and flush it
    Put {
        /// Path to the swap file
        swapfile: PathBuf,
        /// Block number to overwrite
        block: i64,
        /// File whose bytes replace the block's contents
        data: PathBuf,
    },

    /// Read a block's contents out to a file
    Get {
        /// Path to the swap file
        swapfile: PathBuf,
        /// Block number to read
        block: i64,
        /// Destination file for the block's raw bytes
        out: PathBuf,
    },

    /// Flush dirty blocks to the swap file
    Sync {
        /// Path to the swap file
        swapfile: PathBuf,
        /// Include negative-numbered (memory-only) blocks too
        #[arg(long)]
        all: bool,
        /// Issue fsync after writing
        #[arg(long)]
        flush: bool,
    },

    /// Evict unlocked clean/writable blocks across every MemFile this
    /// process has open (demonstrates the global pressure-release path;
    /// with a single swap file argument there is exactly one MemFile to
    /// release from by the time this runs)
    Release {
        /// Swap files to open before releasing
        swapfiles: Vec<PathBuf>,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Stat { swapfile } => cmd_stat(&swapfile),
        Command::New {
            swapfile,
            data,
            negative,
            pages,
        } => cmd_new(&swapfile, data.as_deref(), negative, pages),
        Command::Put {
            swapfile,
            block,
            data,
        } => cmd_put(&swapfile, block, &data),
        Command::Get {
            swapfile,
            block,
            out,
        } => cmd_get(&swapfile, block, &out),
        Command::Sync {
            swapfile,
            all,
            flush,
        } => cmd_sync(&swapfile, all, flush),
        Command::Release { swapfiles } => cmd_release(&swapfiles),
    }
}

fn open_existing(swapfile: &std::path::Path) -> Result<MemFile> {
    MemFile::open(Some(swapfile), OpenFlags::empty())
        .with_context(|| format!("opening swap file {}", swapfile.display()))
}

fn open_or_create(swapfile: &std::path::Path) -> Result<MemFile> {
    if swapfile.exists() {
        open_existing(swapfile)
    } else {
        MemFile::open(Some(swapfile), OpenFlags::CREATE_NEW)
            .with_context(|| format!("creating swap file {}", swapfile.display()))
    }
}

fn cmd_stat(swapfile: &std::path::Path) -> Result<()> {
    let mf = open_existing(swapfile)?;
    println!("swap file:     {}", swapfile.display());
    println!("page size:     {}", mf.page_size());
    println!("blocknr_max:   {}", mf.blocknr_max());
    println!("blocknr_min:   {}", mf.blocknr_min());
    println!("infile_count:  {}", mf.infile_count());
    println!("blocks cached: {}", mf.block_count());
    println!("dirty:         {}", mf.is_dirty());
    Ok(())
}

fn cmd_new(
    swapfile: &std::path::Path,
    data: Option<&std::path::Path>,
    negative: bool,
    pages: u32,
) -> Result<()> {
    let mf = open_or_create(swapfile)?;
    let mut handle = mf.new_block(negative, pages);
    if let Some(data_path) = data {
        let bytes = fs::read(data_path)
            .with_context(|| format!("reading {}", data_path.display()))?;
        let dst = handle.data_mut();
        let n = bytes.len().min(dst.len());
        dst[..n].copy_from_slice(&bytes[..n]);
    }
    let bnum = handle.bnum();
    drop(handle);

    let infile = !negative;
    let assigned = mf.put(bnum, true, infile)?;
    mf.sync(SyncFlags::ALL | SyncFlags::FLUSH)?;
    println!("allocated block {bnum}, now at {assigned}");
    Ok(())
}

fn cmd_put(swapfile: &std::path::Path, block: i64, data: &std::path::Path) -> Result<()> {
    let mf = open_existing(swapfile)?;
    let bytes = fs::read(data).with_context(|| format!("reading {}", data.display()))?;
    {
        let mut handle = mf
            .get_block(block, 1)?
            .with_context(|| format!("block {block} not found"))?;
        let dst = handle.data_mut();
        let n = bytes.len().min(dst.len());
        dst[..n].copy_from_slice(&bytes[..n]);
    }
    mf.put(block, true, false)?;
    mf.sync(SyncFlags::ALL | SyncFlags::FLUSH)?;
    println!("updated block {block}");
    Ok(())
}

fn cmd_get(swapfile: &std::path::Path, block: i64, out: &std::path::Path) -> Result<()> {
    let mf = open_existing(swapfile)?;
    let Some(handle) = mf.get_block(block, 1)? else {
        bail!("block {block} not found");
    };
    fs::write(out, handle.data()).with_context(|| format!("writing {}", out.display()))?;
    println!("wrote block {block} ({} bytes) to {}", handle.data().len(), out.display());
    Ok(())
}

fn cmd_sync(swapfile: &std::path::Path, all: bool, flush: bool) -> Result<()> {
    let mf = open_existing(swapfile)?;
    let mut flags = SyncFlags::empty();
    if all {
        flags |= SyncFlags::ALL;
    }
    if flush {
        flags |= SyncFlags::FLUSH;
    }
    mf.sync(flags)?;
    println!("synced {} (dirty={})", swapfile.display(), mf.is_dirty());
    Ok(())
}

fn cmd_release(swapfiles: &[PathBuf]) -> Result<()> {
    if swapfiles.is_empty() {
        bail!("pass at least one swap file to open before releasing");
    }
    let mut opened = Vec::new();
    for path in swapfiles {
        opened.push(open_existing(path)?);
    }
    let released = memfile::release_all();
    for (path, mf) in swapfiles.iter().zip(&opened) {
        println!("{}: {} blocks cached after release", path.display(), mf.block_count());
    }
    println!("released_any = {released}");
    Ok(())
}
