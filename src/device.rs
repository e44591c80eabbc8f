//! The emulated DS323x device: register bank, advance engine, alarm engine
//! and the byte-level bus protocol.
//!
//! Notes:
//! - `tick()` is meant for the 1 Hz timer ISR and only bumps the tick
//!   accumulator; `update()` commits queued ticks into the calendar.
//! - `update()` must run exactly at the commit points: when the bus is idle,
//!   when a start-for-write addressed to us arrives, and when the read
//!   cursor wraps to 0x00 (the latter is handled by `i2c_next_addr`). Do
//!   not commit in the middle of a sequential read, it would tear the
//!   snapshot the host is reading.
//! - All bus input is untrusted: writes are masked and clamped into valid
//!   states, reads outside the bank return 0. No operation fails.

use bitflags::bitflags;

use crate::bcd;
use crate::calendar;
use crate::datetime::DateTime;
use crate::regs::{bit, mask, reg, FIXED_REGS};
use crate::tick::TickCounter;

/// Default 7-bit bus address of the emulated device.
pub const DS323X_ADDR: u8 = 0x68;

bitflags! {
    /// Follow-up obligations a register write places on the bus driver.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Action: u8 {
        /// Restart the 1 Hz timebase so the next tick is a full second away.
        const RESET_TIMER = 1 << 0;
        /// Start a temperature acquisition, if the board has a sensor.
        const CONVERT_TEMPERATURE = 1 << 1;
    }
}

/// Software emulation of the DS3231/DS3232 register bank.
///
/// `SRAM_SIZE` is the amount of user SRAM behind the fixed registers: 0 for
/// the DS3231, 236 for the DS3232 (see [`SoftDs3231`] / [`SoftDs3232`]).
pub struct Soft323x<const SRAM_SIZE: usize> {
    regs: [u8; FIXED_REGS],
    sram: [u8; SRAM_SIZE],
    ticks: TickCounter,
    /// A date/month/year register was written since the last commit; the
    /// next commit clamps the date against the then-current month length.
    date_written: bool,
}

/// DS3231 variant: no user SRAM.
pub type SoftDs3231 = Soft323x<0>;

/// DS3232 variant: 236 bytes of battery-backed user SRAM.
pub type SoftDs3232 = Soft323x<236>;

impl<const SRAM_SIZE: usize> Soft323x<SRAM_SIZE> {
    /// Total number of addressable bytes in the bank.
    pub const BANK_SIZE: usize = FIXED_REGS + SRAM_SIZE;

    pub fn new() -> Self {
        let mut rtc = Self {
            regs: [0; FIXED_REGS],
            sram: [0; SRAM_SIZE],
            ticks: TickCounter::new(),
            date_written: false,
        };
        rtc.reset();
        rtc
    }

    /// Restore the fixed registers to their power-on defaults:
    /// 2019-01-01 (a Tuesday) 00:00:00, 24-hour mode, alarms cleared,
    /// OSF set. User SRAM is battery-backed and survives the reset.
    pub fn reset(&mut self) {
        self.regs[reg::SECONDS as usize] = 0x00;
        self.regs[reg::MINUTES as usize] = 0x00;
        self.regs[reg::HOURS as usize] = 0x00;
        self.regs[reg::DAY as usize] = 0x02;
        self.regs[reg::DATE as usize] = 0x01;
        self.regs[reg::MONTH as usize] = 0x01 | bit::MONTH_CENTURY0;
        self.regs[reg::YEAR as usize] = 0x19;

        self.regs[reg::ALARM_1_SECONDS as usize] = 0x00;
        self.regs[reg::ALARM_1_MINUTES as usize] = 0x00;
        self.regs[reg::ALARM_1_HOURS as usize] = 0x00;
        self.regs[reg::ALARM_1_DAY_DATE as usize] = 0x01;

        self.regs[reg::ALARM_2_MINUTES as usize] = 0x00;
        self.regs[reg::ALARM_2_HOURS as usize] = 0x00;
        self.regs[reg::ALARM_2_DAY_DATE as usize] = 0x01;

        self.regs[reg::CTRL_1 as usize] = bit::CTRL_1_RS2 | bit::CTRL_1_RS1 | bit::CTRL_1_INTCN;
        self.regs[reg::CTRL_2 as usize] = bit::CTRL_2_OSF;
        self.regs[reg::AGING_OFFSET as usize] = 0x00;
        // temperature reads as the "never measured" sentinel
        self.regs[reg::TEMP_MSB as usize] = 0xFF;
        self.regs[reg::TEMP_LSB as usize] = 0xC0;
        self.regs[reg::CTRL_3 as usize] = 0x00;

        self.ticks.clear();
        self.date_written = false;
    }

    /// Flag the oscillator as stopped (OSF in control 2). Meant to be called
    /// after a cold boot or a detected loss of the timebase; only the host
    /// clears the flag again.
    pub fn set_osf(&mut self) {
        self.regs[reg::CTRL_2 as usize] |= bit::CTRL_2_OSF;
    }

    /// Queue one elapsed second. Safe to call from the timer ISR while any
    /// other method runs; nothing but the tick accumulator is touched.
    #[inline]
    pub fn tick(&self) {
        self.ticks.increment();
    }

    /// Commit all queued ticks into the calendar and evaluate the alarms
    /// once per tick. Returns true iff time advanced.
    ///
    /// Must be called when (and only when) the bus is idle, a start-for-write
    /// addressed to us arrives, or the read cursor wraps to 0x00 — and at
    /// least once every 255 seconds.
    pub fn update(&mut self) -> bool {
        // Canonicalise a freshly written date against the month length.
        if self.date_written {
            let days = bcd::bin_to_bcd(calendar::days_in_month(self.month(), self.year()));
            let date = self.rd(reg::DATE) & mask::DATE;
            *self.reg_mut(reg::DATE) = bcd::clamp(date, 0x01, days);
            self.date_written = false;
        }

        let ticks = self.ticks.take();
        for _ in 0..ticks {
            self.advance_second();
            self.evaluate_alarms();
        }
        ticks != 0
    }

    // Bus protocol

    /// Read the byte at `addr`. Addresses beyond the bank read as 0.
    pub fn i2c_read(&self, addr: u8) -> u8 {
        if (addr as usize) < FIXED_REGS {
            self.regs[addr as usize]
        } else if let Some(i) = Self::sram_index(addr) {
            self.sram[i]
        } else {
            0
        }
    }

    /// Advance the bus cursor past one transferred byte.
    ///
    /// The cursor wraps modulo the full 8-bit address space; a wrap to 0x00
    /// recommits queued ticks so a sequential read that crosses the end of
    /// the bank restarts from a coherent snapshot.
    pub fn i2c_next_addr(&mut self, addr: u8) -> u8 {
        let next = addr.wrapping_add(1);
        if next == 0 {
            self.update();
        }
        next
    }

    /// Write `value` to the register at `addr`, applying the per-register
    /// masking, clamping and side effects. Returns the actions the bus
    /// driver has to take care of. Writes beyond the bank are dropped.
    pub fn i2c_write(&mut self, addr: u8, value: u8) -> Action {
        match addr {
            reg::SECONDS => {
                *self.reg_mut(reg::SECONDS) = bcd::clamp(value & mask::SECONDS, 0x00, 0x59);
                // restart the countdown: the written second lasts a full second
                self.ticks.clear();
                return Action::RESET_TIMER;
            }
            reg::MINUTES => {
                *self.reg_mut(reg::MINUTES) = bcd::clamp(value & mask::MINUTES, 0x00, 0x59);
            }
            reg::HOURS => {
                *self.reg_mut(reg::HOURS) = sanitize_hours(value);
            }
            reg::DAY => {
                *self.reg_mut(reg::DAY) = bcd::clamp(value & mask::DAY, 0x01, 0x07);
            }
            reg::DATE => {
                *self.reg_mut(reg::DATE) = bcd::clamp(value & mask::DATE, 0x01, 0x31);
                self.date_written = true;
            }
            reg::MONTH => {
                let century =
                    value & (bit::MONTH_CENTURY0 | bit::MONTH_CENTURY1 | bit::MONTH_CENTURY2);
                *self.reg_mut(reg::MONTH) = century | bcd::clamp(value & mask::MONTH, 0x01, 0x12);
                self.date_written = true;
            }
            reg::YEAR => {
                *self.reg_mut(reg::YEAR) = bcd::clamp(value, 0x00, 0x99);
                self.date_written = true;
            }
            reg::ALARM_1_SECONDS => {
                *self.reg_mut(reg::ALARM_1_SECONDS) =
                    (value & bit::ALARM_MODE) | bcd::clamp(value & mask::SECONDS, 0x00, 0x59);
            }
            reg::ALARM_1_MINUTES | reg::ALARM_2_MINUTES => {
                self.regs[addr as usize] =
                    (value & bit::ALARM_MODE) | bcd::clamp(value & mask::MINUTES, 0x00, 0x59);
            }
            reg::ALARM_1_HOURS | reg::ALARM_2_HOURS => {
                self.regs[addr as usize] = (value & bit::ALARM_MODE) | sanitize_hours(value);
            }
            reg::ALARM_1_DAY_DATE | reg::ALARM_2_DAY_DATE => {
                self.regs[addr as usize] = if value & bit::ALARM_IS_DAY != 0 {
                    (value & (bit::ALARM_MODE | bit::ALARM_IS_DAY))
                        | bcd::clamp(value & mask::DAY, 0x01, 0x07)
                } else {
                    (value & bit::ALARM_MODE) | bcd::clamp(value & mask::DATE, 0x01, 0x31)
                };
            }
            reg::CTRL_1 => {
                // CONV stays set until the conversion collaborator clears it;
                // the host may set it but never reset it.
                let conv = self.rd(reg::CTRL_1) & bit::CTRL_1_CONV;
                *self.reg_mut(reg::CTRL_1) = value | conv;
                if value & bit::CTRL_1_CONV != 0 {
                    return Action::CONVERT_TEMPERATURE;
                }
            }
            reg::CTRL_2 => {
                // OSF/A1F/A2F are clear-only from the bus; everything else,
                // BSY included, is stored as written.
                const STICKY: u8 = bit::CTRL_2_OSF | bit::CTRL_2_A1F | bit::CTRL_2_A2F;
                let old = self.rd(reg::CTRL_2);
                *self.reg_mut(reg::CTRL_2) = (value & !STICKY) | (old & value & STICKY);
            }
            reg::AGING_OFFSET => {
                *self.reg_mut(reg::AGING_OFFSET) = value;
            }
            reg::TEMP_MSB | reg::TEMP_LSB => {} // read-only from the bus
            reg::CTRL_3 => {
                *self.reg_mut(reg::CTRL_3) = value & bit::CTRL_3_BB_TD;
            }
            _ => {
                if let Some(i) = Self::sram_index(addr) {
                    self.sram[i] = value;
                }
            }
        }
        Action::empty()
    }

    // Time/date accessors

    /// Current seconds, 0..=59.
    pub fn seconds(&self) -> u8 {
        bcd::bcd_to_bin(self.rd(reg::SECONDS) & mask::SECONDS)
    }

    /// Current minutes, 0..=59.
    pub fn minutes(&self) -> u8 {
        bcd::bcd_to_bin(self.rd(reg::MINUTES) & mask::MINUTES)
    }

    /// Current hour normalised to the 24-hour form, even when the register
    /// bank runs in 12-hour mode.
    pub fn hours(&self) -> u8 {
        let hours = self.rd(reg::HOURS);
        if hours & bit::HOUR_12H != 0 {
            let h = bcd::bcd_to_bin(hours & mask::HOURS_12H);
            match (hours & bit::HOUR_PM != 0, h) {
                (true, 12) => 12,
                (true, _) => h + 12,
                (false, 12) => 0,
                (false, _) => h,
            }
        } else {
            bcd::bcd_to_bin(hours & mask::HOURS_24H)
        }
    }

    /// Day of week, 1..=7. The mapping is user-defined; the reset default
    /// treats Monday as 1.
    pub fn day(&self) -> u8 {
        bcd::bcd_to_bin(self.rd(reg::DAY) & mask::DAY)
    }

    /// Day of month, 1..=31.
    pub fn date(&self) -> u8 {
        bcd::bcd_to_bin(self.rd(reg::DATE) & mask::DATE)
    }

    /// Month, 1..=12.
    pub fn month(&self) -> u8 {
        bcd::bcd_to_bin(self.rd(reg::MONTH) & mask::MONTH)
    }

    /// Full year: 1900 plus the BCD year plus the century counter.
    pub fn year(&self) -> u16 {
        let month = self.rd(reg::MONTH);
        let mut year = 1900 + bcd::bcd_to_bin(self.rd(reg::YEAR)) as u16;
        if month & bit::MONTH_CENTURY0 != 0 {
            year += 100;
        }
        if month & bit::MONTH_CENTURY1 != 0 {
            year += 200;
        }
        if month & bit::MONTH_CENTURY2 != 0 {
            year += 400;
        }
        year
    }

    /// Snapshot of the current instant in binary form.
    pub fn datetime(&self) -> DateTime {
        DateTime {
            year: self.year(),
            month: self.month(),
            day: self.date(),
            weekday: self.day(),
            hour: self.hours(),
            minute: self.minutes(),
            second: self.seconds(),
        }
    }

    // Internals

    #[inline]
    fn rd(&self, addr: u8) -> u8 {
        self.regs[addr as usize]
    }

    #[inline]
    fn reg_mut(&mut self, addr: u8) -> &mut u8 {
        &mut self.regs[addr as usize]
    }

    #[inline]
    fn sram_index(addr: u8) -> Option<usize> {
        let offset = (addr as usize).checked_sub(FIXED_REGS)?;
        (offset < SRAM_SIZE).then_some(offset)
    }

    /// Advance the calendar by one second, short-circuiting as soon as a
    /// field does not carry over.
    fn advance_second(&mut self) {
        if !bcd::increment(self.reg_mut(reg::SECONDS), mask::SECONDS, 0x59, 0x00) {
            return;
        }
        if !bcd::increment(self.reg_mut(reg::MINUTES), mask::MINUTES, 0x59, 0x00) {
            return;
        }

        if self.rd(reg::HOURS) & bit::HOUR_12H != 0 {
            // 12-hour mode: the counter runs 1..=12 and a nominal 13 wraps
            // back to 1 without a date change (12:59 -> 1:00 inside the same
            // half-day). The half-day flips on the 11 -> 12 edge.
            let wrapped = bcd::increment(self.reg_mut(reg::HOURS), mask::HOURS_12H, 0x12, 0x01);
            if wrapped || self.rd(reg::HOURS) & mask::HOURS_12H != 0x12 {
                return;
            }
            *self.reg_mut(reg::HOURS) ^= bit::HOUR_PM;
            if self.rd(reg::HOURS) & bit::HOUR_PM != 0 {
                // it just became noon; the date does not change
                return;
            }
            // it just became midnight; roll the date over
        } else if !bcd::increment(self.reg_mut(reg::HOURS), mask::HOURS_24H, 0x23, 0x00) {
            return;
        }

        // a new day has started
        bcd::increment(self.reg_mut(reg::DAY), mask::DAY, 0x07, 0x01);

        let days = bcd::bin_to_bcd(calendar::days_in_month(self.month(), self.year()));
        if !bcd::increment(self.reg_mut(reg::DATE), mask::DATE, days, 0x01) {
            return;
        }
        if !bcd::increment(self.reg_mut(reg::MONTH), mask::MONTH, 0x12, 0x01) {
            return;
        }
        if !bcd::increment(self.reg_mut(reg::YEAR), mask::YEAR, 0x99, 0x00) {
            return;
        }

        // a new century: step the three-bit counter in the month register
        *self.reg_mut(reg::MONTH) ^= bit::MONTH_CENTURY0;
        if self.rd(reg::MONTH) & bit::MONTH_CENTURY0 == 0 {
            *self.reg_mut(reg::MONTH) ^= bit::MONTH_CENTURY1;
            if self.rd(reg::MONTH) & bit::MONTH_CENTURY1 == 0 {
                *self.reg_mut(reg::MONTH) ^= bit::MONTH_CENTURY2;
                // no more bits to carry into
            }
        }
    }

    /// Latch A1F/A2F for alarms matching the current second. The flags are
    /// sticky; only a host write to control 2 clears them.
    fn evaluate_alarms(&mut self) {
        if self.alarm_1_due() {
            self.regs[reg::CTRL_2 as usize] |= bit::CTRL_2_A1F;
        }
        if self.alarm_2_due() {
            self.regs[reg::CTRL_2 as usize] |= bit::CTRL_2_A2F;
        }
    }

    fn alarm_1_due(&self) -> bool {
        alarm_field_matches(
            self.rd(reg::ALARM_1_SECONDS),
            self.rd(reg::SECONDS),
            mask::SECONDS,
        ) && alarm_field_matches(
            self.rd(reg::ALARM_1_MINUTES),
            self.rd(reg::MINUTES),
            mask::MINUTES,
        ) && alarm_field_matches(self.rd(reg::ALARM_1_HOURS), self.rd(reg::HOURS), 0x7F)
            && self.alarm_day_date_matches(self.rd(reg::ALARM_1_DAY_DATE))
    }

    fn alarm_2_due(&self) -> bool {
        // alarm 2 has no seconds register; it can only fire at ss == 00
        self.rd(reg::SECONDS) & mask::SECONDS == 0x00
            && alarm_field_matches(
                self.rd(reg::ALARM_2_MINUTES),
                self.rd(reg::MINUTES),
                mask::MINUTES,
            )
            && alarm_field_matches(self.rd(reg::ALARM_2_HOURS), self.rd(reg::HOURS), 0x7F)
            && self.alarm_day_date_matches(self.rd(reg::ALARM_2_DAY_DATE))
    }

    fn alarm_day_date_matches(&self, alarm: u8) -> bool {
        if alarm & bit::ALARM_MODE != 0 {
            return true;
        }
        if alarm & bit::ALARM_IS_DAY != 0 {
            alarm & mask::DAY == self.rd(reg::DAY) & mask::DAY
        } else {
            alarm & mask::DATE == self.rd(reg::DATE) & mask::DATE
        }
    }
}

impl<const SRAM_SIZE: usize> Default for Soft323x<SRAM_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

/// Masked and clamped hour byte, shared by the time and alarm hour
/// registers. The 12-hour flag in `value` selects the valid range; the mode
/// flags ride along, and in 24-hour form they read back as zero.
fn sanitize_hours(value: u8) -> u8 {
    if value & bit::HOUR_12H != 0 {
        (value & (bit::HOUR_12H | bit::HOUR_PM))
            | bcd::clamp(value & mask::HOURS_12H, 0x01, 0x12)
    } else {
        bcd::clamp(value & mask::HOURS_24H, 0x00, 0x23)
    }
}

/// One alarm field matches if its "don't care" bit is set or the masked BCD
/// payloads compare equal.
#[inline]
fn alarm_field_matches(alarm: u8, time: u8, field_mask: u8) -> bool {
    alarm & bit::ALARM_MODE != 0 || alarm & field_mask == time & field_mask
}
