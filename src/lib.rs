//! ds3231 real-time clock driver
//!
//! Calendar arithmetic for 2000-2099 ([convert], [`DateTime`]), the ds3231 BCD register codec
//! ([registers]), a blocking driver over any [`embedded_hal::i2c::I2c`] bus ([`DS3231`]), and a
//! bit-banged bus for boards without a free I2C peripheral ([`SoftI2c`]).
//!
//! All times are UTC.
#![cfg_attr(not(test), no_std)]

pub mod convert;
pub mod datetime;
pub mod ds3231;
pub mod registers;
pub mod soft_i2c;

pub use crate::{
    datetime::{DateTime, DateTimeError},
    ds3231::DS3231,
    registers::{HourMode, RegisterImage},
    soft_i2c::SoftI2c,
};
