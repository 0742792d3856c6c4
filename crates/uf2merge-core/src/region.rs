use assert_into::AssertInto;
use log::debug;

use crate::{
    address_range::AddressRange,
    uf2::{UF2_MAX_PAYLOAD_SIZE, Uf2Block},
};

/// Generates zero payload blocks tiling `range` in chunks of at most
/// `page_size` bytes. The last block is shortened to end exactly on `range.to`.
///
/// An inverted range (`from > to`) produces no blocks.
pub fn synthesize_range(
    range: AddressRange,
    page_size: u32,
    flags: u32,
    file_container: u32,
) -> Vec<Uf2Block> {
    assert!(
        page_size > 0 && page_size <= UF2_MAX_PAYLOAD_SIZE,
        "page size {} does not fit in a UF2 block",
        page_size
    );
    assert!(
        range.to <= u32::MAX as u64,
        "range {} lies outside the 32 bit address space",
        range
    );

    if range.from > range.to {
        return Vec::new();
    }

    debug!("Zero filling {} ({} bytes)", range, range.size());

    let mut blocks = Vec::with_capacity(range.size().div_ceil(page_size as u64) as usize);
    let mut addr = range.from;

    while addr <= range.to {
        let payload_size = (page_size as u64).min(range.to - addr + 1);
        blocks.push(Uf2Block::zeroed(
            addr.assert_into(),
            payload_size.assert_into(),
            flags,
            file_container,
        ));
        addr += payload_size;
    }

    blocks
}
