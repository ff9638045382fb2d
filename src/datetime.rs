//! Calendar value type for the 2000-2099 window

use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use crate::convert::{self, MAX_YEAR_OFFSET};

/// Reasons a [DateTime] cannot be constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeError {
    /// A field, or the instant as a whole, falls outside 2000-01-01 .. 2099-12-31
    OutOfRange,
    /// A build timestamp literal did not have the `"Mon dd yyyy"` / `"hh:mm:ss"` shape
    Malformed,
}

impl fmt::Display for DateTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange => f.write_str("date or time out of range"),
            Self::Malformed => f.write_str("malformed timestamp literal"),
        }
    }
}

/// A UTC date and time between 2000-01-01 00:00:00 and 2099-12-31 23:59:59
///
/// Always holds a valid calendar date. Equality and ordering compare [`DateTime::secondstime`], not
/// the individual fields.
#[derive(Debug, Clone, Copy)]
pub struct DateTime {
    year_offset: u8,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl DateTime {
    /// 2000-01-01 00:00:00, linear time zero
    pub const EPOCH: Self = Self::from_parts(0, 1, 1, 0, 0, 0);

    /// Moment the crate was compiled, as recorded by the build script
    pub const BUILD_TIME: Self =
        Self::from_build_strings(env!("DS3231_BUILD_DATE"), env!("DS3231_BUILD_TIME"));

    /// Fields are trusted to be valid; only for callers that derived them arithmetically
    pub(crate) const fn from_parts(
        year_offset: u8,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Self {
        Self {
            year_offset,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Construct from explicit fields, `year` being the full year (2000-2099)
    ///
    /// # Errors
    /// Returns [`DateTimeError::OutOfRange`] if any field is out of range or the day does not exist
    /// in that month
    pub const fn try_new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, DateTimeError> {
        if year < 2000 || year > 2000 + MAX_YEAR_OFFSET as u16 {
            return Err(DateTimeError::OutOfRange);
        }
        let year_offset = (year - 2000) as u8;

        if month == 0 || month > 12 {
            return Err(DateTimeError::OutOfRange);
        }
        if day == 0 || day > convert::month_length(month, convert::is_leap(year_offset)) {
            return Err(DateTimeError::OutOfRange);
        }
        if hour > 23 || minute > 59 || second > 59 {
            return Err(DateTimeError::OutOfRange);
        }

        Ok(Self::from_parts(
            year_offset,
            month,
            day,
            hour,
            minute,
            second,
        ))
    }

    /// Construct from explicit fields
    ///
    /// # Panics
    /// Panics where [`DateTime::try_new`] would return an error
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        if let Ok(v) = Self::try_new(year, month, day, hour, minute, second) {
            return v;
        }
        panic!("date or time out of range");
    }

    /// Construct from seconds since 2000-01-01 00:00:00
    ///
    /// # Errors
    /// Returns [`DateTimeError::OutOfRange`] for instants after 2099
    pub const fn try_from_secondstime(seconds: u32) -> Result<Self, DateTimeError> {
        match convert::decompose(seconds) {
            Some(v) => Ok(v),
            None => Err(DateTimeError::OutOfRange),
        }
    }

    /// Construct from Unix time (seconds since 1970-01-01 00:00:00 UTC)
    ///
    /// # Errors
    /// Returns [`DateTimeError::OutOfRange`] for instants before 2000 or after 2099
    pub const fn try_from_epoch(epoch: u32) -> Result<Self, DateTimeError> {
        match convert::from_unix(epoch) {
            Some(seconds) => Self::try_from_secondstime(seconds),
            None => Err(DateTimeError::OutOfRange),
        }
    }

    /// Construct from a pair of build timestamp literals, e.g. `"Dec 26 2009"` and `"12:34:56"`
    ///
    /// The day may be space-padded (`"Jan  1 2024"`).
    ///
    /// # Errors
    /// Returns [`DateTimeError::Malformed`] if either literal has the wrong shape, or
    /// [`DateTimeError::OutOfRange`] if the fields do not form a date in 2000-2099
    pub const fn try_from_build_strings(date: &str, time: &str) -> Result<Self, DateTimeError> {
        let d = date.as_bytes();
        let t = time.as_bytes();

        if d.len() != 11 || d[3] != b' ' || d[6] != b' ' {
            return Err(DateTimeError::Malformed);
        }
        if t.len() != 8 || t[2] != b':' || t[5] != b':' {
            return Err(DateTimeError::Malformed);
        }

        // Jan Feb Mar Apr May Jun Jul Aug Sep Oct Nov Dec
        let month = match d[0] {
            b'J' if d[1] == b'a' => 1,
            b'J' if d[2] == b'n' => 6,
            b'J' => 7,
            b'F' => 2,
            b'M' if d[2] == b'r' => 3,
            b'M' => 5,
            b'A' if d[2] == b'r' => 4,
            b'A' => 8,
            b'S' => 9,
            b'O' => 10,
            b'N' => 11,
            b'D' => 12,
            _ => return Err(DateTimeError::Malformed),
        };

        let (Some(century), Some(decade), Some(day), Some(hour), Some(minute), Some(second)) = (
            two_digits(d[7], d[8], false),
            two_digits(d[9], d[10], false),
            two_digits(d[4], d[5], true),
            two_digits(t[0], t[1], false),
            two_digits(t[3], t[4], false),
            two_digits(t[6], t[7], false),
        ) else {
            return Err(DateTimeError::Malformed);
        };

        if century != 20 {
            return Err(DateTimeError::OutOfRange);
        }

        Self::try_new(2000 + decade as u16, month, day, hour, minute, second)
    }

    /// Construct from a pair of build timestamp literals
    ///
    /// # Panics
    /// Panics where [`DateTime::try_from_build_strings`] would return an error
    #[must_use]
    pub const fn from_build_strings(date: &str, time: &str) -> Self {
        if let Ok(v) = Self::try_from_build_strings(date, time) {
            return v;
        }
        panic!("malformed build timestamp");
    }

    /// Full year, 2000-2099
    #[must_use]
    pub const fn year(&self) -> u16 {
        2000 + self.year_offset as u16
    }

    /// Years since 2000, 0-99
    #[must_use]
    pub const fn year_offset(&self) -> u8 {
        self.year_offset
    }

    /// Month, 1-12
    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// Day of the month, 1-31
    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Hour, 0-23
    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute, 0-59
    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Second, 0-59
    #[must_use]
    pub const fn second(&self) -> u8 {
        self.second
    }

    /// Day of the week, 0 = Sunday
    #[must_use]
    pub const fn day_of_week(&self) -> u8 {
        convert::day_of_week(self.year_offset, self.month, self.day)
    }

    /// Seconds since 2000-01-01 00:00:00
    #[must_use]
    pub const fn secondstime(&self) -> u32 {
        let days = convert::day_count(self.year_offset, self.month, self.day);
        convert::linear_seconds(days, self.hour, self.minute, self.second)
    }

    /// Unix time; only meaningful if the value is UTC
    #[must_use]
    pub const fn epoch(&self) -> u32 {
        // Cannot overflow: 2099-12-31 23:59:59 is 4_102_444_799
        self.secondstime() + convert::SECONDS_FROM_1970_TO_2000
    }

    /// Text pieces of `YYYY-MM-DD HH:MM:SS`, one per character
    const fn pieces(&self) -> [&'static str; 19] {
        let [c0, c1] = decimal(20);
        let [y0, y1] = decimal(self.year_offset);
        let [mo0, mo1] = decimal(self.month);
        let [d0, d1] = decimal(self.day);
        let [h0, h1] = decimal(self.hour);
        let [mi0, mi1] = decimal(self.minute);
        let [s0, s1] = decimal(self.second);

        [
            c0, c1, y0, y1, "-", mo0, mo1, "-", d0, d1, " ", h0, h1, ":", mi0, mi1, ":", s0, s1,
        ]
    }
}

impl Default for DateTime {
    fn default() -> Self {
        Self::EPOCH
    }
}

impl PartialEq for DateTime {
    fn eq(&self, other: &Self) -> bool {
        self.secondstime() == other.secondstime()
    }
}

impl Eq for DateTime {}

impl PartialOrd for DateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.secondstime().cmp(&other.secondstime())
    }
}

impl Hash for DateTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.secondstime().hash(state);
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for piece in self.pieces() {
            f.write_str(piece)?;
        }
        Ok(())
    }
}

impl ufmt::uDisplay for DateTime {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        for piece in self.pieces() {
            f.write_str(piece)?;
        }
        Ok(())
    }
}

/// Parse two ASCII digits; with `pad` a leading space counts as zero
const fn two_digits(tens: u8, ones: u8, pad: bool) -> Option<u8> {
    let tens = match tens {
        b' ' if pad => 0,
        b'0'..=b'9' => tens - b'0',
        _ => return None,
    };
    match ones {
        b'0'..=b'9' => Some(tens * 10 + ones - b'0'),
        _ => None,
    }
}

/// Both digits of a value below 100
const fn decimal(value: u8) -> [&'static str; 2] {
    let bcd = crate::registers::to_bcd(value);
    [digit(bcd >> 4), digit(bcd & 0xf)]
}

const fn digit(digit: u8) -> &'static str {
    match digit {
        0 => "0",
        1 => "1",
        2 => "2",
        3 => "3",
        4 => "4",
        5 => "5",
        6 => "6",
        7 => "7",
        8 => "8",
        9 => "9",
        _ => unreachable!(),
    }
}
