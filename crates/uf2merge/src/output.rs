use std::{
    error::Error,
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::Path,
};

use log::{LevelFilter, debug, info, warn};
use uf2merge_core::{
    read_blocks,
    uf2::{UF2_BLOCK_SIZE, Uf2Block},
    write_blocks,
};

use crate::reporter::ProgressBarReporter;

/// Loads the valid blocks of a UF2 file, skipping anything malformed.
pub fn read_input<P: AsRef<Path>>(path: P) -> Result<Vec<Uf2Block>, Box<dyn Error>> {
    let path = path.as_ref();
    let input = BufReader::new(File::open(path)?);
    let blocks = read_blocks(input)?;

    debug!("Read {} valid blocks from {}", blocks.len(), path.display());

    Ok(blocks)
}

/// Writes `blocks` to `path`. A partially written file is removed again.
pub fn write_output<P: AsRef<Path>>(path: P, blocks: &[Uf2Block]) -> Result<(), Box<dyn Error>> {
    let path = path.as_ref();
    let output = BufWriter::new(File::create(path)?);

    let should_print_progress = log::max_level() >= LevelFilter::Info;
    if should_print_progress {
        info!("Writing {} blocks to {}", blocks.len(), path.display());
    }

    let len = (blocks.len() * UF2_BLOCK_SIZE) as u64;
    let mut reporter = ProgressBarReporter::new(len, output, should_print_progress);
    let result = write_blocks(blocks, &mut reporter);
    reporter.finish();

    if let Err(err) = result {
        discard_partial_output(path);
        return Err(Box::new(err));
    }

    Ok(())
}

/// Best effort removal. The caller keeps reporting the write error that led here.
fn discard_partial_output(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        warn!("Failed to remove partial output {}: {}", path.display(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, process};
    use uf2merge_core::renumber;

    fn scratch_file(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("uf2merge-{}-{}", process::id(), name))
    }

    #[test]
    fn written_blocks_read_back() {
        let path = scratch_file("output-round-trip.uf2");
        let mut blocks: Vec<_> = (0..3)
            .map(|i| Uf2Block::zeroed(0x10000000 + i * 256, 256, 0x2000, 0xe48bff56))
            .collect();
        renumber(&mut blocks);

        write_output(&path, &blocks).unwrap();

        assert_eq!(fs::metadata(&path).unwrap().len(), 3 * 512);
        assert_eq!(read_input(&path).unwrap(), blocks);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn discarding_removes_the_file() {
        let path = scratch_file("output-discard.uf2");
        fs::write(&path, [0u8; 100]).unwrap();

        discard_partial_output(&path);
        assert!(!path.exists());

        // A second removal fails quietly
        discard_partial_output(&path);
        assert!(!path.exists());
    }
}
