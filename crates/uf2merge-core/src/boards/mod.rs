pub use rp2040::RP2040;
pub use rp2350::RP2350;

use crate::address_range::AddressRange;

pub mod rp2040;
pub mod rp2350;

/// This is a helper struct, which allows you to iterate over every board defined
pub struct BoardIter {
    inner: std::vec::IntoIter<Box<dyn BoardInfo>>,
}

impl BoardIter {
    /// Creates a new BoardIter
    pub fn new() -> Self {
        Self {
            inner: vec![
                Box::new(RP2040::default()) as Box<dyn BoardInfo>,
                Box::new(RP2350::default()),
            ]
            .into_iter(),
        }
    }

    pub fn find_by_name(name: &str) -> Option<Box<dyn BoardInfo>> {
        Self::new().find(|board| board.board_name().eq_ignore_ascii_case(name))
    }
}

impl Iterator for BoardIter {
    type Item = Box<dyn BoardInfo>;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Address bounds the merge engine works against. All ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashLayout {
    pub flash_base: u64,
    pub flash_end: u64,
    pub erase_start: u64,
    pub erase_end: u64,
    /// Payload size of synthesized zero fill blocks
    pub page_size: u32,
}

impl FlashLayout {
    pub fn flash(&self) -> AddressRange {
        AddressRange::new(self.flash_base, self.flash_end)
    }

    pub fn erase_region(&self) -> AddressRange {
        AddressRange::new(self.erase_start, self.erase_end)
    }
}

/// This trait helps by allowing for definitions of multiple different boards.
pub trait BoardInfo {
    /// Start of the memory mapped flash
    fn flash_base(&self) -> u64;

    /// Inclusive end of the memory mapped flash
    fn flash_end(&self) -> u64;

    /// Optional, defaults to the last 128 KiB of flash
    fn erase_region(&self) -> AddressRange {
        AddressRange::new(self.flash_end() + 1 - 0x20000, self.flash_end())
    }

    /// Optional, just sent to a sensible default of 256, as long as it is less than 512 - 32 - 4 it should be okay, but consumers vary
    fn page_size(&self) -> u32 {
        256
    }

    fn layout(&self) -> FlashLayout {
        let erase = self.erase_region();
        FlashLayout {
            flash_base: self.flash_base(),
            flash_end: self.flash_end(),
            erase_start: erase.from,
            erase_end: erase.to,
            page_size: self.page_size(),
        }
    }

    /// Get the board's name
    fn board_name(&self) -> String;
}
