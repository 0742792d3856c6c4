use assert_into::AssertInto;
use log::{debug, info};

use crate::{
    Uf2MergeError,
    address_range::AddressRange,
    boards::FlashLayout,
    region::synthesize_range,
    uf2::Uf2Block,
};

/// How the input images are assembled into one output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Concatenate the inputs in the order given. With `include_erase` the
    /// erase region is appended as zero blocks, otherwise every block reaching
    /// into the erase region is dropped.
    Combine { include_erase: bool },
    /// Require strictly ordered, non-overlapping inputs and zero fill every
    /// gap between them as well as the tail up to the end of flash.
    GapFill,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineReport {
    pub input_blocks: Vec<usize>,
    /// Set when the erase region was appended
    pub erase_region: Option<AddressRange>,
    pub erase_blocks: usize,
    /// Blocks dropped for reaching into the erase region
    pub dropped_blocks: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub blocks: usize,
    pub range: AddressRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapFillReport {
    pub segments: Vec<Segment>,
    /// Zero blocks inserted after each segment but the last
    pub gap_blocks: Vec<usize>,
    pub tail_blocks: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeReport {
    Combine(CombineReport),
    GapFill(GapFillReport),
}

#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub blocks: Vec<Uf2Block>,
    pub report: MergeReport,
}

/// Assembles `inputs` according to `policy` and renumbers the result.
pub fn merge(
    inputs: Vec<Vec<Uf2Block>>,
    policy: MergePolicy,
    layout: &FlashLayout,
) -> Result<MergeOutput, Uf2MergeError> {
    let (blocks, report) = match policy {
        MergePolicy::Combine { include_erase } => {
            let (blocks, report) = combine(inputs, include_erase, layout);
            (blocks, MergeReport::Combine(report))
        }
        MergePolicy::GapFill => {
            let (blocks, report) = gap_fill(inputs, layout)?;
            (blocks, MergeReport::GapFill(report))
        }
    };

    Ok(MergeOutput { blocks, report })
}

pub fn combine(
    inputs: Vec<Vec<Uf2Block>>,
    include_erase: bool,
    layout: &FlashLayout,
) -> (Vec<Uf2Block>, CombineReport) {
    let input_blocks: Vec<usize> = inputs.iter().map(Vec::len).collect();

    // Zero blocks inherit their metadata from the first block on offer
    let (flags, file_container) = inputs
        .iter()
        .find_map(|input| input.first())
        .map(|block| (block.flags, block.file_container))
        .unwrap_or_default();

    let mut blocks: Vec<Uf2Block> = inputs.into_iter().flatten().collect();
    let mut erase_blocks = 0;
    let mut dropped_blocks = 0;

    if include_erase {
        let erase = synthesize_range(
            layout.erase_region(),
            layout.page_size,
            flags,
            file_container,
        );
        erase_blocks = erase.len();
        blocks.extend(erase);
    } else {
        let before = blocks.len();
        blocks.retain(|block| block.end_addr() < layout.erase_start);
        dropped_blocks = before - blocks.len();

        if dropped_blocks > 0 {
            info!(
                "Dropped {} blocks at or beyond {:#010x}",
                dropped_blocks, layout.erase_start
            );
        }
    }

    renumber(&mut blocks);

    let report = CombineReport {
        input_blocks,
        erase_region: include_erase.then(|| layout.erase_region()),
        erase_blocks,
        dropped_blocks,
        total: blocks.len(),
    };

    (blocks, report)
}

pub fn gap_fill(
    inputs: Vec<Vec<Uf2Block>>,
    layout: &FlashLayout,
) -> Result<(Vec<Uf2Block>, GapFillReport), Uf2MergeError> {
    if inputs.is_empty() {
        return Err(Uf2MergeError::NoInputs);
    }

    let segments = inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            AddressRange::spanning(input)
                .map(|range| Segment {
                    blocks: input.len(),
                    range,
                })
                .ok_or(Uf2MergeError::EmptyInput { index })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (index, pair) in segments.windows(2).enumerate() {
        if pair[0].range.to >= pair[1].range.from {
            return Err(Uf2MergeError::OverlapOrOutOfOrder {
                index: index + 1,
                previous_end: pair[0].range.to,
                next_start: pair[1].range.from,
            });
        }
    }

    let last = segments[segments.len() - 1].range;
    if last.to > layout.flash_end {
        return Err(Uf2MergeError::ExceedsFlashBound {
            end: last.to,
            flash_end: layout.flash_end,
        });
    }

    let flags = inputs[0][0].flags;
    let file_container = inputs[0][0].file_container;
    let fill = |range: Option<AddressRange>| {
        range
            .map(|range| synthesize_range(range, layout.page_size, flags, file_container))
            .unwrap_or_default()
    };

    let mut blocks = Vec::new();
    let mut gap_blocks = Vec::with_capacity(segments.len() - 1);

    for (index, input) in inputs.into_iter().enumerate() {
        blocks.extend(input);

        if let Some(next) = segments.get(index + 1) {
            let gap = fill(AddressRange::between(
                segments[index].range.to + 1,
                next.range.from - 1,
            ));
            debug!("Gap after input {}: {} blocks", index + 1, gap.len());
            gap_blocks.push(gap.len());
            blocks.extend(gap);
        }
    }

    let tail = fill(AddressRange::between(last.to + 1, layout.flash_end));
    let tail_blocks = tail.len();
    blocks.extend(tail);

    renumber(&mut blocks);

    let report = GapFillReport {
        segments,
        gap_blocks,
        tail_blocks,
        total: blocks.len(),
    };

    Ok((blocks, report))
}

/// Gives every block its position as `block_no` and the sequence length as
/// `num_blocks`.
pub fn renumber(blocks: &mut [Uf2Block]) {
    let num_blocks: u32 = blocks.len().assert_into();

    for (block_no, block) in blocks.iter_mut().enumerate() {
        block.block_no = block_no.assert_into();
        block.num_blocks = num_blocks;

        debug!(
            "Block {} / {} {:#010x}",
            block.block_no, block.num_blocks, block.target_addr
        );
    }
}
