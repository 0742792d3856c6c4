use std::collections::HashSet;

use thiserror::Error;

use crate::uf2::{BlockDefect, UF2_BLOCK_SIZE, Uf2Block};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub blocks: usize,
}

/// Why a byte stream is not a self-consistent UF2 file. Block indices are
/// positions in the stream, not `block_no` values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("Size {len} is not a multiple of UF2 block size")]
    SizeMisaligned { len: usize },
    #[error("Block {index} could not be decoded")]
    DecodeError { index: usize },
    #[error("Block {index} has {defect}")]
    InvalidBlock { index: usize, defect: BlockDefect },
    #[error("Inconsistent num_blocks in block {index}: {found} vs {expected}")]
    InconsistentTotal {
        index: usize,
        found: u32,
        expected: u32,
    },
    #[error("Declared total blocks {declared} != actual {actual}")]
    TotalMismatch { declared: u32, actual: usize },
    #[error("Non-unique block numbers ({unique}/{total})")]
    DuplicateBlockNumbers { unique: usize, total: usize },
    #[error("File contains no blocks")]
    NoBlocks,
}

/// Strict whole-file check. Unlike [`crate::read_blocks`], nothing is skipped:
/// the first problem found is returned.
pub fn validate_stream(raw: &[u8]) -> Result<StreamSummary, ValidationFailure> {
    if raw.len() % UF2_BLOCK_SIZE != 0 {
        return Err(ValidationFailure::SizeMisaligned { len: raw.len() });
    }

    let total = raw.len() / UF2_BLOCK_SIZE;
    if total == 0 {
        return Err(ValidationFailure::NoBlocks);
    }

    let mut block_numbers = HashSet::with_capacity(total);
    let mut declared_total = None;

    for (index, chunk) in raw.chunks(UF2_BLOCK_SIZE).enumerate() {
        let block =
            Uf2Block::decode(chunk).map_err(|_| ValidationFailure::DecodeError { index })?;

        block
            .check()
            .map_err(|defect| ValidationFailure::InvalidBlock { index, defect })?;

        block_numbers.insert(block.block_no);

        match declared_total {
            None => declared_total = Some(block.num_blocks),
            Some(expected) if expected != block.num_blocks => {
                return Err(ValidationFailure::InconsistentTotal {
                    index,
                    found: block.num_blocks,
                    expected,
                });
            }
            Some(_) => {}
        }
    }

    let declared = declared_total.unwrap_or_default();
    if declared as usize != total {
        return Err(ValidationFailure::TotalMismatch {
            declared,
            actual: total,
        });
    }

    if block_numbers.len() != total {
        return Err(ValidationFailure::DuplicateBlockNumbers {
            unique: block_numbers.len(),
            total,
        });
    }

    Ok(StreamSummary { blocks: total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode_blocks, merge::renumber, uf2::UF2_MAGIC_END};

    fn numbered(count: u32) -> Vec<Uf2Block> {
        let mut blocks: Vec<_> = (0..count)
            .map(|i| Uf2Block::zeroed(0x1000 + i * 256, 256, 0x2000, 0xe48bff56))
            .collect();
        renumber(&mut blocks);
        blocks
    }

    #[test]
    fn well_formed_stream_passes() {
        let raw = encode_blocks(&numbered(5));
        assert_eq!(validate_stream(&raw), Ok(StreamSummary { blocks: 5 }));
    }

    #[test]
    fn misaligned_size() {
        let mut raw = encode_blocks(&numbered(2));
        raw.push(0);
        assert_eq!(
            validate_stream(&raw),
            Err(ValidationFailure::SizeMisaligned { len: 1025 })
        );
    }

    #[test]
    fn empty_stream() {
        assert_eq!(validate_stream(&[]), Err(ValidationFailure::NoBlocks));
    }

    #[test]
    fn bad_start_magic_reports_block_index() {
        let mut blocks = numbered(3);
        blocks[2].magic_start0 = 0x12345678;
        assert_eq!(
            validate_stream(&encode_blocks(&blocks)),
            Err(ValidationFailure::InvalidBlock {
                index: 2,
                defect: BlockDefect::StartMagic(0x12345678),
            })
        );
    }

    #[test]
    fn bad_end_marker_and_payload_size() {
        let mut blocks = numbered(3);
        blocks[1].magic_end = !UF2_MAGIC_END;
        assert!(matches!(
            validate_stream(&encode_blocks(&blocks)),
            Err(ValidationFailure::InvalidBlock {
                index: 1,
                defect: BlockDefect::EndMarker(_),
            })
        ));

        let mut blocks = numbered(3);
        blocks[0].payload_size = 477;
        assert!(matches!(
            validate_stream(&encode_blocks(&blocks)),
            Err(ValidationFailure::InvalidBlock {
                index: 0,
                defect: BlockDefect::PayloadSize(477),
            })
        ));
    }

    #[test]
    fn inconsistent_total() {
        let mut blocks = numbered(3);
        blocks[1].num_blocks = 4;
        assert_eq!(
            validate_stream(&encode_blocks(&blocks)),
            Err(ValidationFailure::InconsistentTotal {
                index: 1,
                found: 4,
                expected: 3,
            })
        );
    }

    #[test]
    fn declared_total_differs_from_block_count() {
        let mut blocks = numbered(3);
        for block in &mut blocks {
            block.num_blocks = 2;
        }
        assert_eq!(
            validate_stream(&encode_blocks(&blocks)),
            Err(ValidationFailure::TotalMismatch {
                declared: 2,
                actual: 3,
            })
        );
    }

    #[test]
    fn duplicate_block_numbers() {
        let mut blocks = numbered(4);
        blocks[3].block_no = 0;
        assert_eq!(
            validate_stream(&encode_blocks(&blocks)),
            Err(ValidationFailure::DuplicateBlockNumbers {
                unique: 3,
                total: 4,
            })
        );
    }

    #[test]
    fn block_numbers_outside_the_range_pass_when_unique() {
        let mut blocks = numbered(2);
        blocks[1].block_no = 99;
        assert!(validate_stream(&encode_blocks(&blocks)).is_ok());
    }

    #[test]
    fn first_failing_block_wins() {
        let mut blocks = numbered(4);
        blocks[1].num_blocks = 9;
        blocks[3].magic_start0 = 0;
        assert!(matches!(
            validate_stream(&encode_blocks(&blocks)),
            Err(ValidationFailure::InconsistentTotal { index: 1, .. })
        ));
    }
}
