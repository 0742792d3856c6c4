use crate::boards::BoardInfo;

#[derive(Debug, Default, Clone)]
pub struct RP2350;

impl BoardInfo for RP2350 {
    fn flash_base(&self) -> u64 {
        FLASH_START_RP2350
    }

    fn flash_end(&self) -> u64 {
        FLASH_END_RP2350
    }

    fn board_name(&self) -> String {
        "rp2350".to_string()
    }
}

// 4 MiB of flash, as on the Pico 2
pub const FLASH_START_RP2350: u64 = 0x10000000;
pub const FLASH_END_RP2350: u64 = 0x103FFFFF;
