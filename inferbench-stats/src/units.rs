//! Duration Units
//!
//! Picks a display unit for a duration in seconds so that the scaled value
//! lands in `[1, 1000)` where possible.

/// Choose a unit for a duration given in seconds.
///
/// Returns the short unit name and the number of seconds per unit.
/// Durations of a second or more, and non-positive or non-finite values,
/// stay in seconds.
pub fn select_duration_unit(seconds: f64) -> (&'static str, f64) {
    if !seconds.is_finite() || seconds <= 0.0 {
        return ("s", 1.0);
    }

    let exponent = (seconds.log10().floor() / 3.0).floor() as i32;
    match exponent {
        -3 => ("ns", 1e-9),
        -2 => ("us", 1e-6),
        -1 => ("ms", 1e-3),
        _ => ("s", 1.0),
    }
}

/// Long name of a short duration unit
pub fn humanize_unit(unit: &str) -> Option<&'static str> {
    match unit {
        "ns" => Some("nanosecond"),
        "us" => Some("microsecond"),
        "ms" => Some("millisecond"),
        "s" => Some("second"),
        _ => None,
    }
}

/// Format a duration in seconds with an automatically chosen unit
pub fn format_duration(seconds: f64) -> String {
    let (unit, scale) = select_duration_unit(seconds);
    format!("{:.3} {}", seconds / scale, unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_duration_unit() {
        let cases = [
            (1.0, "s"),
            (5.0, "s"),
            (10.0, "s"),
            (500.0, "s"),
            (0.1, "ms"),
            (0.6, "ms"),
            (0.01, "ms"),
            (0.001, "ms"),
            (0.004, "ms"),
            (0.0001, "us"),
            (0.0008, "us"),
            (0.00002, "us"),
            (0.000001, "us"),
            (0.000007, "us"),
            (0.0000001, "ns"),
            (0.00000005, "ns"),
            (0.000000001, "ns"),
        ];

        for (t, expected) in cases {
            let (unit, _) = select_duration_unit(t);
            assert_eq!(unit, expected, "unit for {}", t);
        }
    }

    #[test]
    fn test_scales() {
        assert_eq!(select_duration_unit(0.5), ("ms", 1e-3));
        assert_eq!(select_duration_unit(0.0005), ("us", 1e-6));
        assert_eq!(select_duration_unit(0.0000005), ("ns", 1e-9));
    }

    #[test]
    fn test_degenerate_inputs_stay_in_seconds() {
        assert_eq!(select_duration_unit(0.0), ("s", 1.0));
        assert_eq!(select_duration_unit(-1.0), ("s", 1.0));
        assert_eq!(select_duration_unit(f64::NAN), ("s", 1.0));
    }

    #[test]
    fn test_humanize_unit() {
        assert_eq!(humanize_unit("ns"), Some("nanosecond"));
        assert_eq!(humanize_unit("s"), Some("second"));
        assert_eq!(humanize_unit("h"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.00125), "1.250 ms");
        assert_eq!(format_duration(2.0), "2.000 s");
    }
}
