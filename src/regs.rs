//! Register map of the emulated DS323x bank.
//!
//! Addresses, field masks and register bits follow the DS3231/DS3232
//! datasheet. One deviation: the three high bits of the month register form
//! a binary century counter on top of 1900 (CENTURY0 is the least
//! significant bit, each step worth 100 years), extending the usable range
//! far past the original century flag.

/// Number of fixed (non-SRAM) registers. User SRAM, if any, starts here.
pub const FIXED_REGS: usize = 0x14;

/// Register addresses.
pub mod reg {
    pub const SECONDS: u8 = 0x00; // 00-59 BCD
    pub const MINUTES: u8 = 0x01; // 00-59 BCD
    pub const HOURS: u8 = 0x02; // BCD plus 12-hour/PM flags
    pub const DAY: u8 = 0x03; // day of week 1-7
    pub const DATE: u8 = 0x04; // 01-31 BCD
    pub const MONTH: u8 = 0x05; // 01-12 BCD plus century bits
    pub const YEAR: u8 = 0x06; // 00-99 BCD

    pub const ALARM_1_SECONDS: u8 = 0x07;
    pub const ALARM_1_MINUTES: u8 = 0x08;
    pub const ALARM_1_HOURS: u8 = 0x09;
    pub const ALARM_1_DAY_DATE: u8 = 0x0A;

    pub const ALARM_2_MINUTES: u8 = 0x0B;
    pub const ALARM_2_HOURS: u8 = 0x0C;
    pub const ALARM_2_DAY_DATE: u8 = 0x0D;

    pub const CTRL_1: u8 = 0x0E;
    pub const CTRL_2: u8 = 0x0F; // control/status
    pub const AGING_OFFSET: u8 = 0x10;
    pub const TEMP_MSB: u8 = 0x11;
    pub const TEMP_LSB: u8 = 0x12;
    pub const CTRL_3: u8 = 0x13;

    pub const SRAM: u8 = 0x14; // user SRAM on the DS3232 (236 bytes)
}

/// Field masks of the BCD time registers.
pub mod mask {
    pub const SECONDS: u8 = 0x7F;
    pub const MINUTES: u8 = 0x7F;
    pub const HOURS_12H: u8 = 0x1F;
    pub const HOURS_24H: u8 = 0x3F;
    pub const DAY: u8 = 0x07;
    pub const DATE: u8 = 0x3F;
    pub const MONTH: u8 = 0x1F;
    pub const YEAR: u8 = 0xFF;
}

/// Individual register bits.
pub mod bit {
    pub const HOUR_12H: u8 = 0x40; // hours register uses the 12-hour format
    pub const HOUR_PM: u8 = 0x20; // PM; only meaningful together with HOUR_12H

    // Binary century counter in the month register, CENTURY0 least
    // significant. Each step adds 100 years on top of 1900.
    pub const MONTH_CENTURY0: u8 = 0x80;
    pub const MONTH_CENTURY1: u8 = 0x40;
    pub const MONTH_CENTURY2: u8 = 0x20;

    pub const ALARM_MODE: u8 = 0x80; // field is "don't care" in the alarm match
    pub const ALARM_IS_DAY: u8 = 0x40; // compare day of week instead of date

    pub const CTRL_1_EOSC: u8 = 0x80;
    pub const CTRL_1_BBSQW: u8 = 0x40;
    pub const CTRL_1_CONV: u8 = 0x20;
    pub const CTRL_1_RS2: u8 = 0x10;
    pub const CTRL_1_RS1: u8 = 0x08;
    pub const CTRL_1_INTCN: u8 = 0x04;
    pub const CTRL_1_A2IE: u8 = 0x02;
    pub const CTRL_1_A1IE: u8 = 0x01;

    pub const CTRL_2_OSF: u8 = 0x80;
    pub const CTRL_2_BB32KHZ: u8 = 0x40;
    pub const CTRL_2_CRATE1: u8 = 0x20;
    pub const CTRL_2_CRATE0: u8 = 0x10;
    pub const CTRL_2_EN32KHZ: u8 = 0x08;
    pub const CTRL_2_BSY: u8 = 0x04;
    pub const CTRL_2_A2F: u8 = 0x02;
    pub const CTRL_2_A1F: u8 = 0x01;

    pub const CTRL_3_BB_TD: u8 = 0x01;
}
