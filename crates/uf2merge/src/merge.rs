use std::{
    error::Error,
    path::{Path, PathBuf},
    process::ExitCode,
};

use log::info;
use uf2merge_core::{
    MergeOutput, MergePolicy, MergeReport,
    boards::BoardInfo,
    merge::{CombineReport, GapFillReport},
};

use crate::{
    output::{read_input, write_output},
    validate::{VALIDATION_FAILED, report_check},
};

/// What happened to an output file that was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Written,
    /// Written, but the file failed the post-write validation
    ValidationFailed,
}

impl From<MergeOutcome> for ExitCode {
    fn from(outcome: MergeOutcome) -> Self {
        match outcome {
            MergeOutcome::Written => ExitCode::SUCCESS,
            MergeOutcome::ValidationFailed => ExitCode::from(VALIDATION_FAILED),
        }
    }
}

/// Reads `inputs`, merges them under `policy` and writes the result to `output`.
///
/// Nothing is written when the inputs are rejected. For [`MergePolicy::Combine`]
/// the written file is validated afterwards. A failure is reported through the
/// outcome, but the file is kept.
pub fn merge_files(
    inputs: &[PathBuf],
    output: &Path,
    policy: MergePolicy,
    board: &dyn BoardInfo,
) -> Result<MergeOutcome, Box<dyn Error>> {
    let layout = board.layout();
    info!("Using {} flash layout {}", board.board_name(), layout.flash());

    let inputs = inputs
        .iter()
        .map(read_input)
        .collect::<Result<Vec<_>, _>>()?;

    let MergeOutput { blocks, report } = uf2merge_core::merge(inputs, policy, &layout)?;

    write_output(output, &blocks)?;

    match report {
        MergeReport::Combine(report) => {
            if !report_check(output) {
                return Ok(MergeOutcome::ValidationFailed);
            }
            print_combine_report(&report);
            Ok(MergeOutcome::Written)
        }
        MergeReport::GapFill(report) => {
            print_gap_fill_report(&report);
            Ok(MergeOutcome::Written)
        }
    }
}

fn print_combine_report(report: &CombineReport) {
    let counts = report
        .input_blocks
        .iter()
        .map(|count| format!("{} blocks", count))
        .collect::<Vec<_>>()
        .join(" + ");

    match report.erase_region {
        Some(erase_region) => {
            info!(
                "Combined {} + {} blocks from erase-region = {} total.",
                counts, report.erase_blocks, report.total
            );
            info!("Zeroed region appended as blocks {}.", erase_region);
        }
        None => {
            info!("Combined {} = {} total.", counts, report.total);
            if report.dropped_blocks > 0 {
                info!(
                    "Dropped {} blocks reaching into the erase region.",
                    report.dropped_blocks
                );
            }
            info!("No zeroed erase-region appended. Output truncated before the erase region.");
        }
    }
}

fn print_gap_fill_report(report: &GapFillReport) {
    for (index, segment) in report.segments.iter().enumerate() {
        info!(
            "{:<12}{} blocks ({})",
            format!("UF2 #{}:", index + 1),
            segment.blocks,
            segment.range
        );

        let (label, fill) = match report.gap_blocks.get(index) {
            Some(gap) => ("Gap fill:", *gap),
            None => ("Tail fill:", report.tail_blocks),
        };
        if fill > 0 {
            info!("{:<12}{} blocks", label, fill);
        } else {
            info!("{:<12}none", label);
        }
    }

    info!("{:<12}{} blocks", "Total:", report.total);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs, process};
    use uf2merge_core::{
        Uf2MergeError, boards::RP2040, encode_blocks, renumber, uf2::Uf2Block, validate_stream,
    };

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("uf2merge-{}-{}", process::id(), name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Writes `count` contiguous 256 byte blocks starting at `start`.
    fn write_image(path: &Path, start: u32, count: u32) {
        let mut blocks: Vec<_> = (0..count)
            .map(|i| Uf2Block::zeroed(start + i * 256, 256, 0x2000, 0xe48bff56))
            .collect();
        renumber(&mut blocks);
        fs::write(path, encode_blocks(&blocks)).unwrap();
    }

    #[test]
    fn combine_keeps_output_that_fails_validation() {
        let dir = scratch_dir("combine-all-dropped");
        let (a, b, out) = (dir.join("a.uf2"), dir.join("b.uf2"), dir.join("out.uf2"));
        // Both images sit inside the erase region, so truncation leaves nothing
        write_image(&a, 0x101E0000, 2);
        write_image(&b, 0x101F0000, 1);

        let outcome = merge_files(
            &[a, b],
            &out,
            MergePolicy::Combine {
                include_erase: false,
            },
            &RP2040,
        )
        .unwrap();

        assert_eq!(outcome, MergeOutcome::ValidationFailed);
        assert_eq!(fs::metadata(&out).unwrap().len(), 0);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn combine_writes_validated_output() {
        let dir = scratch_dir("combine-ok");
        let (a, b, out) = (dir.join("a.uf2"), dir.join("b.uf2"), dir.join("out.uf2"));
        write_image(&a, 0x10000000, 3);
        write_image(&b, 0x10100000, 2);

        let outcome = merge_files(
            &[a, b],
            &out,
            MergePolicy::Combine {
                include_erase: true,
            },
            &RP2040,
        )
        .unwrap();

        assert_eq!(outcome, MergeOutcome::Written);
        let summary = validate_stream(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(summary.blocks, 5 + 0x20000 / 256);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn gap_fill_rejection_writes_nothing() {
        let dir = scratch_dir("gap-fill-out-of-order");
        let (a, b, out) = (dir.join("a.uf2"), dir.join("b.uf2"), dir.join("out.uf2"));
        write_image(&a, 0x101E0000, 1);
        write_image(&b, 0x10000000, 1);

        let err = merge_files(&[a, b], &out, MergePolicy::GapFill, &RP2040).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Uf2MergeError>(),
            Some(Uf2MergeError::OverlapOrOutOfOrder { index: 1, .. })
        ));
        assert!(!out.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn gap_fill_with_empty_input_writes_nothing() {
        let dir = scratch_dir("gap-fill-empty");
        let (a, b, out) = (dir.join("a.uf2"), dir.join("b.uf2"), dir.join("out.uf2"));
        write_image(&a, 0x10000000, 1);
        fs::write(&b, [0xFFu8; 512]).unwrap();

        let err = merge_files(&[a, b], &out, MergePolicy::GapFill, &RP2040).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Uf2MergeError>(),
            Some(Uf2MergeError::EmptyInput { index: 1 })
        ));
        assert!(!out.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn gap_fill_covers_the_whole_flash() {
        let dir = scratch_dir("gap-fill-ok");
        let (a, b, out) = (dir.join("a.uf2"), dir.join("b.uf2"), dir.join("out.uf2"));
        write_image(&a, 0x10000000, 2);
        write_image(&b, 0x10100000, 2);

        let outcome = merge_files(&[a, b], &out, MergePolicy::GapFill, &RP2040).unwrap();

        assert_eq!(outcome, MergeOutcome::Written);
        // 2 MiB of 256 byte pages
        let summary = validate_stream(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(summary.blocks, 8192);
        fs::remove_dir_all(&dir).unwrap();
    }
}
