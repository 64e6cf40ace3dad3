use std::time::Duration;

/// Binary unit suffixes, one step per factor of 1024.
const BYTE_UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
const BYTE_STEP: f64 = 1024.0;

/// Formats a byte amount with two decimals in the largest fitting binary unit,
/// e.g. `12.00KB`.
pub(crate) fn format_bytes(bytes: f64) -> String {
    let mut value = if bytes.is_finite() { bytes.max(0.0) } else { 0.0 };
    let mut unit = BYTE_UNITS.first().copied().unwrap_or("B");
    for next_unit in BYTE_UNITS.iter().copied().skip(1) {
        if value < BYTE_STEP {
            break;
        }
        value /= BYTE_STEP;
        unit = next_unit;
    }
    format!("{:.2}{}", value, unit)
}

/// Formats a latency; a missing value prints as `0ns`.
pub(crate) fn format_latency(latency: Option<Duration>) -> String {
    format!("{:?}", latency.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_use_binary_units() -> Result<(), String> {
        let cases = [
            (0.0, "0.00B"),
            (512.0, "512.00B"),
            (12_288.0, "12.00KB"),
            (1_572_864.0, "1.50MB"),
            (1_073_741_824.0, "1.00GB"),
        ];
        for (input, expected) in cases {
            let formatted = format_bytes(input);
            if formatted != expected {
                return Err(format!(
                    "format_bytes({}) = {}, expected {}",
                    input, formatted, expected
                ));
            }
        }
        Ok(())
    }

    #[test]
    fn bytes_reject_non_finite() -> Result<(), String> {
        let formatted = format_bytes(f64::NAN);
        if formatted != "0.00B" {
            return Err(format!("NaN should format as zero, got {}", formatted));
        }
        Ok(())
    }

    #[test]
    fn latency_defaults_to_zero() -> Result<(), String> {
        let formatted = format_latency(None);
        if formatted != "0ns" {
            return Err(format!("Unexpected empty latency: {}", formatted));
        }
        let formatted = format_latency(Some(Duration::from_millis(12)));
        if formatted != "12ms" {
            return Err(format!("Unexpected latency: {}", formatted));
        }
        Ok(())
    }
}
