//! ds3231 RTC abstractions and API

use core::fmt;

use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, trace, warn};

use crate::{
    registers::{
        encode_hours, to_bcd, HourMode, RegisterImage, REG_DATE, REG_HOURS, REG_MINUTES,
        REG_MONTH, REG_SECONDS, REG_STATUS, REG_YEAR, STATUS_OSF,
    },
    DateTime, DateTimeError,
};

/// Fixed 7-bit bus address of the ds3231
pub const DS3231_ADDR: u8 = 0x68;

type I2cResult<E, T = ()> = Result<T, Error<E>>;

/// Driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// The bus transaction failed
    Bus(E),
    /// A field value was outside its calendar range; nothing was written
    OutOfRange(u8),
    /// A timestamp could not be represented as a date in 2000-2099
    DateTime(DateTimeError),
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "i2c bus error: {e:?}"),
            Self::OutOfRange(value) => write!(f, "value {value} out of range"),
            Self::DateTime(e) => write!(f, "{e}"),
        }
    }
}

/// ds3231 real-time clock module; interfaced via I2C
///
/// No internal state; can be freely constructed/destructed if the I2C bus must be shared.
/// Every operation blocks until its transactions complete.
#[must_use]
pub struct DS3231<I2C> {
    i2c: I2C,
}

// Specialized methods
impl<I2C: I2c> DS3231<I2C> {
    /// Connect to ds3231 by taking ownership of the I2C bus
    pub const fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Disconnect to release the I2C bus
    #[must_use]
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Write the build timestamp to the chip if it is later than the chip's time
    ///
    /// Intended to be called once at startup: a chip that lost power or was never set reads as
    /// an early time and gets seeded, a running chip is left alone.
    ///
    /// Returns whether the time was written.
    ///
    /// # Errors
    /// Returns an error if something goes wrong on the I2C bus while writing
    pub fn match_compile_time(&mut self) -> I2cResult<I2C::Error, bool> {
        self.match_build_time(DateTime::BUILD_TIME)
    }

    /// Write `build` to the chip if it is strictly later than the chip's time
    ///
    /// Returns whether the time was written.
    ///
    /// # Errors
    /// Returns an error if something goes wrong on the I2C bus while writing
    pub fn match_build_time(&mut self, build: DateTime) -> I2cResult<I2C::Error, bool> {
        let now = self.get_date_time();
        if build > now {
            debug!("rtc behind build time ({} < {}), seeding", now.epoch(), build.epoch());
            self.set_date_time(&build)?;
            Ok(true)
        } else {
            debug!("rtc time {} not behind build time", now.epoch());
            Ok(false)
        }
    }

    /// Current 12/24-hour encoding of the hours register
    ///
    /// # Errors
    /// Returns an error if something goes wrong on the I2C bus
    pub fn hour_mode(&mut self) -> I2cResult<I2C::Error, HourMode> {
        self.read_register(REG_HOURS).map(HourMode::from_register)
    }

    /// Whether the oscillator has stopped since the time was last set; if so the time is not trustworthy
    ///
    /// # Errors
    /// Returns an error if something goes wrong on the I2C bus
    pub fn oscillator_stopped(&mut self) -> I2cResult<I2C::Error, bool> {
        self.read_register(REG_STATUS)
            .map(|status| status & STATUS_OSF != 0)
    }

    fn read_register(&mut self, reg: u8) -> I2cResult<I2C::Error, u8> {
        let mut buf = [0u8];
        self.i2c.write_read(DS3231_ADDR, &[reg], &mut buf)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> I2cResult<I2C::Error> {
        trace!("rtc write {:#04x} <- {:#04x}", reg, value);
        self.i2c.write(DS3231_ADDR, &[reg, value])?;
        Ok(())
    }

    fn read_image(&mut self) -> Result<RegisterImage, I2C::Error> {
        let mut buf = [0u8; RegisterImage::LEN];
        self.i2c.write_read(DS3231_ADDR, &[REG_SECONDS], &mut buf)?;
        Ok(RegisterImage(buf))
    }
}

// Time getters
impl<I2C: I2c> DS3231<I2C> {
    /// Get complete date and time reading
    ///
    /// A failed or short read, or registers that do not hold a valid date, are logged and
    /// reported as [`DateTime::default`] (2000-01-01 00:00:00). A 12 o'clock reading in 12-hour
    /// mode comes back as 00 of the next day; see [`RegisterImage::to_date_time`].
    pub fn get_date_time(&mut self) -> DateTime {
        let image = match self.read_image() {
            Ok(image) => image,
            Err(e) => {
                warn!("couldn't read time: {:?}", e.kind());
                return DateTime::default();
            }
        };

        match image.to_date_time() {
            Ok(now) => now,
            Err(e) => {
                warn!("couldn't decode time {:02x?}: {}", image.0, e);
                DateTime::default()
            }
        }
    }

    /// Alias of [`DS3231::get_date_time`]
    pub fn now(&mut self) -> DateTime {
        self.get_date_time()
    }

    /// Get Unix time; see [`DS3231::get_date_time`] for failure behaviour
    pub fn get_epoch(&mut self) -> u32 {
        self.get_date_time().epoch()
    }

    /// Get years since 2000
    ///
    /// Note: reads the complete date and time; prefer [`DS3231::get_date_time`] for more than one field
    pub fn get_year(&mut self) -> u8 {
        self.get_date_time().year_offset()
    }

    /// Get month
    ///
    /// Note: reads the complete date and time
    pub fn get_month(&mut self) -> u8 {
        self.get_date_time().month()
    }

    /// Get day of the month
    ///
    /// Note: reads the complete date and time
    pub fn get_day(&mut self) -> u8 {
        self.get_date_time().day()
    }

    /// Get hours in 24-hour format
    ///
    /// Note: reads the complete date and time
    pub fn get_hours(&mut self) -> u8 {
        self.get_date_time().hour()
    }

    /// Get minutes
    ///
    /// Note: reads the complete date and time
    pub fn get_minutes(&mut self) -> u8 {
        self.get_date_time().minute()
    }

    /// Get seconds
    ///
    /// Note: reads the complete date and time
    pub fn get_seconds(&mut self) -> u8 {
        self.get_date_time().second()
    }
}

// Time setters
impl<I2C: I2c> DS3231<I2C> {
    /// Set complete date and time
    ///
    /// Written one register at a time, year first and seconds last; a failure part way through
    /// leaves the earlier registers updated.
    ///
    /// # Errors
    /// Returns an error if something goes wrong on the I2C bus
    pub fn set_date_time(&mut self, date_time: &DateTime) -> I2cResult<I2C::Error> {
        self.set_year(date_time.year_offset())?;
        self.set_month(date_time.month())?;
        self.set_day(date_time.day())?;
        self.set_hours(date_time.hour())?;
        self.set_minutes(date_time.minute())?;
        self.set_seconds(date_time.second())
    }

    /// Set from Unix time
    ///
    /// # Errors
    /// Returns an error if `epoch` is outside 2000-2099 or something goes wrong on the I2C bus
    pub fn set_epoch(&mut self, epoch: u32) -> I2cResult<I2C::Error> {
        let date_time = DateTime::try_from_epoch(epoch).map_err(Error::DateTime)?;
        self.set_date_time(&date_time)
    }

    /// Set years since 2000
    ///
    /// # Errors
    /// Returns an error if `year` is above 99 or something goes wrong on the I2C bus
    pub fn set_year(&mut self, year: u8) -> I2cResult<I2C::Error> {
        check_range(year, 0, 99)?;
        self.write_register(REG_YEAR, to_bcd(year))
    }

    /// Set month
    ///
    /// # Errors
    /// Returns an error if `month` is not in `1..=12` or something goes wrong on the I2C bus
    pub fn set_month(&mut self, month: u8) -> I2cResult<I2C::Error> {
        check_range(month, 1, 12)?;
        self.write_register(REG_MONTH, to_bcd(month))
    }

    /// Set day of the month
    ///
    /// # Errors
    /// Returns an error if `day` is not in `1..=31` or something goes wrong on the I2C bus
    pub fn set_day(&mut self, day: u8) -> I2cResult<I2C::Error> {
        check_range(day, 1, 31)?;
        self.write_register(REG_DATE, to_bcd(day))
    }

    /// Set hours from a 24-hour value, keeping the chip's 12/24-hour mode
    ///
    /// # Errors
    /// Returns an error if `hours` is above 23 or something goes wrong on the I2C bus
    pub fn set_hours(&mut self, hours: u8) -> I2cResult<I2C::Error> {
        check_range(hours, 0, 23)?;
        let mode = self.hour_mode()?;
        self.write_register(REG_HOURS, encode_hours(hours, mode))
    }

    /// Set minutes
    ///
    /// # Errors
    /// Returns an error if `minutes` is above 59 or something goes wrong on the I2C bus
    pub fn set_minutes(&mut self, minutes: u8) -> I2cResult<I2C::Error> {
        check_range(minutes, 0, 59)?;
        self.write_register(REG_MINUTES, to_bcd(minutes))
    }

    /// Set seconds and clear the oscillator-stop flag
    ///
    /// # Errors
    /// Returns an error if `seconds` is above 59 or something goes wrong on the I2C bus
    pub fn set_seconds(&mut self, seconds: u8) -> I2cResult<I2C::Error> {
        check_range(seconds, 0, 59)?;
        self.write_register(REG_SECONDS, to_bcd(seconds))?;

        let status = self.read_register(REG_STATUS)?;
        self.write_register(REG_STATUS, status & !STATUS_OSF)
    }
}

const fn check_range<E>(value: u8, min: u8, max: u8) -> Result<(), Error<E>> {
    if value < min || value > max {
        Err(Error::OutOfRange(value))
    } else {
        Ok(())
    }
}
