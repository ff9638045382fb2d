//! Calendar arithmetic between date fields and linear seconds
//!
//! All functions assume the 2000-2099 window and UTC. Day 0 is 2000-01-01, which makes the leap
//! year rule a plain "divisible by 4"; the 100/400 year corrections never apply inside the window.

use crate::DateTime;

/// Seconds between the Unix epoch and 2000-01-01 00:00:00
pub const SECONDS_FROM_1970_TO_2000: u32 = 946_684_800;

/// Largest representable year offset (2099)
pub const MAX_YEAR_OFFSET: u8 = 99;

const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Whether `2000 + year_offset` is a leap year
///
/// Note: does not account for 100 year or 400 year correction
#[must_use]
pub const fn is_leap(year_offset: u8) -> bool {
    year_offset % 4 == 0
}

/// Length of `month` (1-based) in days
///
/// # Panics
/// Panics if `month` is not in `1..=12`
#[must_use]
pub const fn month_length(month: u8, leap: bool) -> u8 {
    let days = DAYS_IN_MONTH[(month - 1) as usize];
    if leap && month == 2 {
        days + 1
    } else {
        days
    }
}

/// Days elapsed since 2000-01-01
///
/// # Panics
/// Panics if `month` is above 13, or underflows (panicking in debug builds) for day 0 of
/// January 2000
#[must_use]
pub const fn day_count(year_offset: u8, month: u8, day: u8) -> u16 {
    let years = year_offset as u16;

    let mut days = day as u16;
    let mut m = 1;
    while m < month {
        days += DAYS_IN_MONTH[(m - 1) as usize] as u16;
        m += 1;
    }
    if month > 2 && is_leap(year_offset) {
        days += 1;
    }

    // Each elapsed year plus one extra day per elapsed leap year; `day` is 1-based
    days + 365 * years + (years + 3) / 4 - 1
}

/// Seconds elapsed since 2000-01-01 00:00:00 at the given time of day `days` days in
#[must_use]
pub const fn linear_seconds(days: u16, hour: u8, minute: u8, second: u8) -> u32 {
    ((days as u32 * 24 + hour as u32) * 60 + minute as u32) * 60 + second as u32
}

/// Day of the week, 0 = Sunday; 2000-01-01 was a Saturday (6)
#[must_use]
pub const fn day_of_week(year_offset: u8, month: u8, day: u8) -> u8 {
    ((day_count(year_offset, month, day) + 6) % 7) as u8
}

/// Break seconds since 2000-01-01 down into calendar fields
///
/// Returns [None] if the value lands after 2099-12-31 23:59:59
#[must_use]
pub const fn decompose(seconds: u32) -> Option<DateTime> {
    let mut t = seconds;

    let second = (t % 60) as u8;
    t /= 60;
    let minute = (t % 60) as u8;
    t /= 60;
    let hour = (t % 24) as u8;
    let mut days = t / 24;

    let mut year_offset = 0;
    loop {
        let length = 365 + is_leap(year_offset) as u32;
        if days < length {
            break;
        }
        days -= length;

        if year_offset == MAX_YEAR_OFFSET {
            return None;
        }
        year_offset += 1;
    }

    let leap = is_leap(year_offset);
    let mut month = 1;
    loop {
        let length = month_length(month, leap) as u32;
        if days < length {
            break;
        }
        days -= length;
        month += 1;
    }

    Some(DateTime::from_parts(
        year_offset,
        month,
        days as u8 + 1,
        hour,
        minute,
        second,
    ))
}

/// Convert seconds since 2000 into Unix time
#[must_use]
pub const fn to_unix(seconds_since_2000: u32) -> Option<u32> {
    seconds_since_2000.checked_add(SECONDS_FROM_1970_TO_2000)
}

/// Convert Unix time into seconds since 2000; [None] for instants before 2000
#[must_use]
pub const fn from_unix(epoch: u32) -> Option<u32> {
    epoch.checked_sub(SECONDS_FROM_1970_TO_2000)
}
