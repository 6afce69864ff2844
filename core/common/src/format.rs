//! Human-readable byte quantity formatting.

/// Units from bytes up to terabytes, in 1024 steps.
const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count using the largest unit with a scaled value >= 1.
///
/// Returns `"0 B"` for zero so the logarithm below is never taken of 0.
/// Values are rendered with two decimal places, e.g. `1536` becomes
/// `"1.50 KB"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);

    format!("{:.2} {}", scaled, UNITS[exponent])
}
