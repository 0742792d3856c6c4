use crate::{address_range::AddressRange, boards::BoardInfo};

#[derive(Debug, Default, Clone)]
pub struct RP2040;

impl BoardInfo for RP2040 {
    fn flash_base(&self) -> u64 {
        FLASH_START_RP2040
    }

    fn flash_end(&self) -> u64 {
        FLASH_END_RP2040
    }

    fn erase_region(&self) -> AddressRange {
        AddressRange::new(ERASE_START_RP2040, ERASE_END_RP2040)
    }

    fn board_name(&self) -> String {
        "rp2040".to_string()
    }
}

// 2 MiB of flash, as on the Pico
pub const FLASH_START_RP2040: u64 = 0x10000000;
pub const FLASH_END_RP2040: u64 = 0x101FFFFF;

pub const ERASE_START_RP2040: u64 = 0x101E0000;
pub const ERASE_END_RP2040: u64 = 0x101FFFFF;
