use crate::uf2::{UF2_BLOCK_SIZE, Uf2Block};
use std::io::{Read, Write};

use log::*;
use thiserror::Error;

pub mod address_range;
pub mod boards;
pub mod merge;
pub mod region;
pub mod uf2;
pub mod validate;

pub use merge::{MergeOutput, MergePolicy, MergeReport, merge, renumber};
pub use validate::{StreamSummary, ValidationFailure, validate_stream};

#[derive(Error, Debug)]
pub enum Uf2MergeError {
    #[error("A UF2 block needs {} bytes, only {len} available", UF2_BLOCK_SIZE)]
    MalformedBlock { len: usize },
    #[error("Failed to read input")]
    FailedToRead(#[source] std::io::Error),
    #[error("Failed to write to output")]
    FailedToWrite(#[source] std::io::Error),
    #[error("Input {} contains no valid UF2 blocks", .index + 1)]
    EmptyInput { index: usize },
    #[error("No input images given")]
    NoInputs,
    #[error(
        "Input {} starting at {next_start:#010x} overlaps or does not follow the previous input ending at {previous_end:#010x}",
        .index + 1
    )]
    OverlapOrOutOfOrder {
        index: usize,
        previous_end: u64,
        next_start: u64,
    },
    #[error("Image ends at {end:#010x}, past the end of flash at {flash_end:#010x}")]
    ExceedsFlashBound { end: u64, flash_end: u64 },
}

/// Decodes every complete block in `raw` and keeps the structurally valid ones.
///
/// Blocks with a bad magic, end marker or payload size and any trailing partial
/// block are skipped, not reported. [`validate_stream`] applies the strict rules.
pub fn parse_blocks(raw: &[u8]) -> Vec<Uf2Block> {
    let chunks = raw.chunks_exact(UF2_BLOCK_SIZE);
    let trailing = chunks.remainder().len();

    let mut blocks = Vec::with_capacity(raw.len() / UF2_BLOCK_SIZE);
    let mut skipped = 0;

    for (index, chunk) in chunks.enumerate() {
        match Uf2Block::decode(chunk) {
            Ok(block) => match block.check() {
                Ok(()) => blocks.push(block),
                Err(defect) => {
                    debug!("Skipping block {}: {}", index, defect);
                    skipped += 1;
                }
            },
            Err(err) => {
                debug!("Skipping block {}: {}", index, err);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        debug!("Skipped {} invalid blocks", skipped);
    }
    if trailing > 0 {
        debug!("Ignoring {} trailing bytes", trailing);
    }

    blocks
}

/// Reads a whole UF2 stream, see [`parse_blocks`].
pub fn read_blocks(mut input: impl Read) -> Result<Vec<Uf2Block>, Uf2MergeError> {
    let mut raw = Vec::new();
    input
        .read_to_end(&mut raw)
        .map_err(Uf2MergeError::FailedToRead)?;

    Ok(parse_blocks(&raw))
}

pub fn encode_blocks(blocks: &[Uf2Block]) -> Vec<u8> {
    let mut out = Vec::with_capacity(blocks.len() * UF2_BLOCK_SIZE);
    for block in blocks {
        out.extend_from_slice(&block.encode());
    }
    out
}

pub fn write_blocks(blocks: &[Uf2Block], mut output: impl Write) -> Result<(), Uf2MergeError> {
    for block in blocks {
        output
            .write_all(&block.encode())
            .map_err(Uf2MergeError::FailedToWrite)?;
    }

    output.flush().map_err(Uf2MergeError::FailedToWrite)
}
