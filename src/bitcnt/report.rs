use std::io::{self, Write};

use super::count::Count;

const KILO: f64 = 1_000.0;
const MEGA: f64 = 1_000_000.0;
const GIGA: f64 = 1_000_000_000.0;

/// Name used for the grand total line.
pub const TOTAL_NAME: &str = "<total>";

/// Scale a byte count to decimal units. Units are two characters wide so
/// report columns line up.
pub fn human_size(bytes: u64) -> (f64, &'static str) {
    let amount = bytes as f64;
    if amount >= GIGA {
        (amount / GIGA, "GB")
    } else if amount >= MEGA {
        (amount / MEGA, "MB")
    } else if amount >= KILO {
        (amount / KILO, "kB")
    } else {
        (amount, "B ")
    }
}

/// One report line, without the trailing newline:
/// `  12.3 kB -     49.871% ones -     50.129% zeroes - name`
pub fn format_count(count: &Count, name: &str) -> String {
    let (amount, unit) = human_size(count.bytes());
    format!(
        "{:6.1} {} - {:10.3}% ones - {:10.3}% zeroes - {}",
        amount,
        unit,
        count.fraction_ones() * 100.0,
        count.fraction_zeroes() * 100.0,
        name
    )
}

#[inline]
pub fn write_count(out: &mut impl Write, count: &Count, name: &str) -> io::Result<()> {
    writeln!(out, "{}", format_count(count, name))
}
