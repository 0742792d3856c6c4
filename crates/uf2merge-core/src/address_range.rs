use std::fmt;

use crate::uf2::Uf2Block;

/// An inclusive address range. Addresses are held as `u64` so the end of a
/// block that touches `0xFFFF_FFFF` can still be stepped past.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AddressRange {
    pub from: u64,
    pub to: u64,
}

impl AddressRange {
    pub const fn new(from: u64, to: u64) -> Self {
        Self { from, to }
    }

    /// Returns `None` when `from > to`.
    pub fn between(from: u64, to: u64) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    pub fn size(&self) -> u64 {
        self.to.saturating_sub(self.from) + 1
    }

    /// The smallest range covering every payload in `blocks`.
    pub fn spanning(blocks: &[Uf2Block]) -> Option<Self> {
        let from = blocks.iter().map(|b| b.target_addr as u64).min()?;
        let to = blocks.iter().map(Uf2Block::end_addr).max()?;
        Some(Self { from, to })
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}-0x{:08X}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanning_takes_lowest_start_and_highest_end() {
        let blocks = vec![
            Uf2Block::zeroed(0x2000, 256, 0, 0),
            Uf2Block::zeroed(0x1000, 16, 0, 0),
            Uf2Block::zeroed(0x1800, 256, 0, 0),
        ];
        assert_eq!(
            AddressRange::spanning(&blocks),
            Some(AddressRange::new(0x1000, 0x20FF))
        );
        assert_eq!(AddressRange::spanning(&[]), None);
    }

    #[test]
    fn between_rejects_inverted_bounds() {
        assert_eq!(AddressRange::between(5, 4), None);
        assert_eq!(AddressRange::between(4, 4).map(|r| r.size()), Some(1));
    }

    #[test]
    fn display_is_padded_hex() {
        assert_eq!(
            AddressRange::new(0x1000, 0x11FF).to_string(),
            "0x00001000-0x000011FF"
        );
    }
}
