use std::{error::Error, fmt::Write, fs, path::Path};

use log::warn;
use uf2merge_core::uf2::{UF2_BLOCK_SIZE, Uf2Block};

const PREVIEW_BYTES: usize = 16;

pub fn dump<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn Error>> {
    let raw = fs::read(path)?;
    let chunks = raw.chunks_exact(UF2_BLOCK_SIZE);

    if !chunks.remainder().is_empty() {
        warn!(
            "Ignoring {} trailing bytes after the last whole block",
            chunks.remainder().len()
        );
    }

    for chunk in chunks {
        let block = Uf2Block::decode(chunk)?;
        println!("{}", describe_block(&block));
        println!("----");
    }

    Ok(())
}

/// Human readable listing of one block's header and the start of its data.
pub fn describe_block(block: &Uf2Block) -> String {
    let mut preview = String::new();
    for (i, byte) in block.data[..PREVIEW_BYTES].iter().enumerate() {
        if i > 0 {
            preview.push(' ');
        }
        let _ = write!(preview, "{:02x}", byte);
    }

    format!(
        "Block Number: {}/{}\n\
         Target Address: {:#x}\n\
         Payload Size: {:#x}\n\
         Flags: {:#x}\n\
         File Container: {:#x}\n\
         Payload (first {} bytes): {}",
        block.block_no as u64 + 1,
        block.num_blocks,
        block.target_addr,
        block.payload_size,
        block.flags,
        block.file_container,
        PREVIEW_BYTES,
        preview,
    )
}
