use static_assertions::const_assert;
use std::mem;
use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, byteorder::little_endian::U32};

use crate::Uf2MergeError;

pub const UF2_MAGIC_START0: u32 = 0x0A324655;
pub const UF2_MAGIC_START1: u32 = 0x9E5D5157;
pub const UF2_MAGIC_END: u32 = 0x0AB16F30;

pub const UF2_FLAG_FAMILY_ID_PRESENT: u32 = 0x00002000;

pub const UF2_BLOCK_SIZE: usize = 512;
pub const UF2_HEADER_SIZE: usize = 32;
pub const UF2_FOOTER_SIZE: usize = 4;
pub const UF2_DATA_SIZE: usize = UF2_BLOCK_SIZE - UF2_HEADER_SIZE - UF2_FOOTER_SIZE;

/// Largest payload that still fits between the header and the end marker.
pub const UF2_MAX_PAYLOAD_SIZE: u32 = UF2_DATA_SIZE as u32;

pub type Uf2BlockData = [u8; UF2_DATA_SIZE];

#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Clone, Copy, Debug)]
#[repr(C)]
pub struct Uf2BlockHeader {
    pub magic_start0: U32,
    pub magic_start1: U32,
    pub flags: U32,
    pub target_addr: U32,
    pub payload_size: U32,
    pub block_no: U32,
    pub num_blocks: U32,
    pub file_container: U32, // or familyID
}

#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Clone, Copy, Debug)]
#[repr(C)]
pub struct Uf2BlockFooter {
    pub magic_end: U32,
}

/// The exact on-disk layout of one block.
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Clone, Copy)]
#[repr(C)]
struct RawUf2Block {
    header: Uf2BlockHeader,
    data: Uf2BlockData,
    footer: Uf2BlockFooter,
}

const_assert!(mem::size_of::<Uf2BlockHeader>() == UF2_HEADER_SIZE);
const_assert!(mem::size_of::<Uf2BlockFooter>() == UF2_FOOTER_SIZE);
const_assert!(mem::size_of::<RawUf2Block>() == UF2_BLOCK_SIZE);

/// A decoded UF2 block.
///
/// Every byte of the source block is retained: the whole data area is kept even
/// though only the first `payload_size` bytes are meaningful, so a decoded block
/// encodes back to exactly the bytes it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Uf2Block {
    pub magic_start0: u32,
    pub magic_start1: u32,
    pub flags: u32,
    pub target_addr: u32,
    pub payload_size: u32,
    pub block_no: u32,
    pub num_blocks: u32,
    pub file_container: u32,
    pub data: Uf2BlockData,
    pub magic_end: u32,
}

impl Uf2Block {
    /// Decodes the first 512 bytes of `raw`.
    pub fn decode(raw: &[u8]) -> Result<Self, Uf2MergeError> {
        let (raw_block, _) = RawUf2Block::read_from_prefix(raw)
            .map_err(|_| Uf2MergeError::MalformedBlock { len: raw.len() })?;

        let RawUf2Block {
            header,
            data,
            footer,
        } = raw_block;

        Ok(Self {
            magic_start0: header.magic_start0.get(),
            magic_start1: header.magic_start1.get(),
            flags: header.flags.get(),
            target_addr: header.target_addr.get(),
            payload_size: header.payload_size.get(),
            block_no: header.block_no.get(),
            num_blocks: header.num_blocks.get(),
            file_container: header.file_container.get(),
            data,
            magic_end: footer.magic_end.get(),
        })
    }

    pub fn encode(&self) -> [u8; UF2_BLOCK_SIZE] {
        let raw_block = RawUf2Block {
            header: Uf2BlockHeader {
                magic_start0: U32::new(self.magic_start0),
                magic_start1: U32::new(self.magic_start1),
                flags: U32::new(self.flags),
                target_addr: U32::new(self.target_addr),
                payload_size: U32::new(self.payload_size),
                block_no: U32::new(self.block_no),
                num_blocks: U32::new(self.num_blocks),
                file_container: U32::new(self.file_container),
            },
            data: self.data,
            footer: Uf2BlockFooter {
                magic_end: U32::new(self.magic_end),
            },
        };

        let mut out = [0; UF2_BLOCK_SIZE];
        out.copy_from_slice(raw_block.as_bytes());
        out
    }

    /// Builds a block with an all zero payload. `block_no` and `num_blocks` are
    /// left at 0 until the final sequence is renumbered.
    pub fn zeroed(target_addr: u32, payload_size: u32, flags: u32, file_container: u32) -> Self {
        Self {
            magic_start0: UF2_MAGIC_START0,
            magic_start1: UF2_MAGIC_START1,
            flags,
            target_addr,
            payload_size,
            block_no: 0,
            num_blocks: 0,
            file_container,
            data: [0; UF2_DATA_SIZE],
            magic_end: UF2_MAGIC_END,
        }
    }

    /// The meaningful part of the data area. Clamped to the data area for
    /// blocks with an out of range `payload_size`.
    pub fn payload(&self) -> &[u8] {
        let len = (self.payload_size as usize).min(UF2_DATA_SIZE);
        &self.data[..len]
    }

    /// Inclusive end address of the payload.
    pub fn end_addr(&self) -> u64 {
        (self.target_addr as u64 + self.payload_size as u64).saturating_sub(1)
    }

    /// Checks the fields every well formed block must carry.
    pub fn check(&self) -> Result<(), BlockDefect> {
        if self.magic_start0 != UF2_MAGIC_START0 {
            return Err(BlockDefect::StartMagic(self.magic_start0));
        }
        if self.magic_end != UF2_MAGIC_END {
            return Err(BlockDefect::EndMarker(self.magic_end));
        }
        if self.payload_size == 0 || self.payload_size > UF2_MAX_PAYLOAD_SIZE {
            return Err(BlockDefect::PayloadSize(self.payload_size));
        }
        Ok(())
    }

    pub fn is_structurally_valid(&self) -> bool {
        self.check().is_ok()
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDefect {
    #[error("invalid start magic {0:#010x}")]
    StartMagic(u32),
    #[error("invalid end marker {0:#010x}")]
    EndMarker(u32),
    #[error("invalid payload size {0}")]
    PayloadSize(u32),
}
