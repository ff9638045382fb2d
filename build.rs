//! Records the build timestamp for `DateTime::BUILD_TIME`

use chrono::{DateTime, Utc};

// 2000-01-01 00:00:00 and 2099-12-31 23:59:59, the representable window
const FIRST: i64 = 946_684_800;
const LAST: i64 = 4_102_444_799;

fn main() {
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-changed=src");

    // Reproducible builds pin the timestamp
    let now = std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .unwrap_or_else(|| Utc::now().timestamp());

    let stamp: DateTime<Utc> =
        DateTime::from_timestamp(now.clamp(FIRST, LAST), 0).expect("timestamp within 2000-2099");

    println!(
        "cargo:rustc-env=DS3231_BUILD_DATE={}",
        stamp.format("%b %e %Y")
    );
    println!(
        "cargo:rustc-env=DS3231_BUILD_TIME={}",
        stamp.format("%H:%M:%S")
    );
}
