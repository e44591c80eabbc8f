//! Software emulation of the DS3231/DS3232 real-time clock.
//!
//! Runs on a small microcontroller and presents the familiar DS323x
//! register bank to a host on the I2C bus, so an unmodified host driver
//! (for example the Linux kernel's `rtc-ds3232`) talks to it as if it were
//! the real chip: BCD calendar registers, two alarms, control/status
//! registers and, on the DS3232 variant, user SRAM.
//!
//! The crate is the device core only; bus and timer stay in the firmware:
//! - call [`Soft323x::tick`] from a 1 Hz timer ISR,
//! - call [`Soft323x::update`] from the main loop while the bus is idle and
//!   from the bus ISR when a start-for-write addressed to us arrives,
//! - serve bus traffic with [`Soft323x::i2c_read`] / [`Soft323x::i2c_write`]
//!   and step the register cursor with [`Soft323x::i2c_next_addr`] after
//!   every transferred byte.
//!
//! `i2c_write` returns [`Action`] flags the firmware must honour: restart
//! the 1 Hz timebase after the seconds register was written, and optionally
//! run a temperature conversion when the host requests one.
//!
//! Notes:
//! - `no_std`, no allocator, no `unsafe`. The tick accumulator is guarded
//!   by `critical-section`; the firmware (or the host test harness) picks
//!   the implementation.
//! - All bus input is untrusted and gets masked/clamped into valid states;
//!   nothing here returns an error.
//! - Out of scope: temperature measurement (the registers read a fixed
//!   "not measured" sentinel), the 32 kHz output and interrupt-pin
//!   assertion. Only the in-register alarm flags are maintained.

#![no_std]
#![deny(unsafe_code)]

pub mod bcd;
pub mod calendar;
pub mod regs;

mod datetime;
mod device;
mod tick;

pub use datetime::DateTime;
pub use device::{Action, Soft323x, SoftDs3231, SoftDs3232, DS323X_ADDR};
pub use tick::TickCounter;
