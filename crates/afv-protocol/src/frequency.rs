//! Frequency helpers
//!
//! Frequencies travel over the engine boundary as decimal Hz strings. The
//! aviation band fits comfortably in a `u32`.

use crate::error::ParseError;

/// The "no frequency" convention used by the voice network: 199.998 MHz
pub const UNSET_FREQUENCY_HZ: u32 = 199_998_000;

/// Returns true if the frequency is the unset sentinel or zero
pub fn is_unset(hz: u32) -> bool {
    hz == 0 || hz == UNSET_FREQUENCY_HZ
}

/// Format frequency in MHz with three decimals (e.g. "121.500 MHz")
pub fn format_frequency(hz: u32) -> String {
    if is_unset(hz) {
        return "---".to_string();
    }
    let mhz = hz / 1_000_000;
    let khz = (hz % 1_000_000) / 1_000;
    format!("{}.{:03} MHz", mhz, khz)
}

/// Parse a decimal Hz value as sent by the engine
///
/// Leading/trailing whitespace is tolerated; anything else that is not a
/// positive integer is an error.
pub fn parse_hz(field: &'static str, value: &str) -> Result<u32, ParseError> {
    let trimmed = value.trim();
    match trimmed.parse::<u32>() {
        Ok(hz) if hz > 0 => Ok(hz),
        _ => Err(ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        }),
    }
}

/// Parse user-entered frequency text
///
/// Accepts either MHz with a decimal point ("121.5", "118.275") or a plain
/// integer in Hz ("121500000"). MHz is converted without going through floats
/// so "118.275" is exactly 118_275_000.
pub fn parse_frequency(input: &str) -> Result<u32, ParseError> {
    let text = input.trim();
    let invalid = || ParseError::InvalidFrequency(input.to_string());

    let Some((whole, frac)) = text.split_once('.') else {
        return parse_hz("frequency", text).map_err(|_| invalid());
    };

    if whole.is_empty() || frac.len() > 6 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let mhz: u32 = whole.parse().map_err(|_| invalid())?;
    let mut frac_digits = frac.to_string();
    while frac_digits.len() < 6 {
        frac_digits.push('0');
    }
    let hz_part: u32 = frac_digits.parse().map_err(|_| invalid())?;

    mhz.checked_mul(1_000_000)
        .and_then(|hz| hz.checked_add(hz_part))
        .filter(|hz| *hz > 0)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_frequency() {
        assert_eq!(format_frequency(121_500_000), "121.500 MHz");
        assert_eq!(format_frequency(118_275_000), "118.275 MHz");
        assert_eq!(format_frequency(UNSET_FREQUENCY_HZ), "---");
        assert_eq!(format_frequency(0), "---");
    }

    #[test]
    fn test_parse_hz() {
        assert_eq!(parse_hz("f", "121500000"), Ok(121_500_000));
        assert_eq!(parse_hz("f", " 121500000 "), Ok(121_500_000));
        assert!(parse_hz("f", "").is_err());
        assert!(parse_hz("f", "abc").is_err());
        assert!(parse_hz("f", "-5").is_err());
        assert!(parse_hz("f", "0").is_err());
    }

    #[test]
    fn test_parse_frequency_mhz() {
        assert_eq!(parse_frequency("121.5"), Ok(121_500_000));
        assert_eq!(parse_frequency("118.275"), Ok(118_275_000));
        assert_eq!(parse_frequency("132.8125"), Ok(132_812_500));
        assert_eq!(parse_frequency("121500000"), Ok(121_500_000));
    }

    #[test]
    fn test_parse_frequency_rejects_garbage() {
        assert!(parse_frequency("").is_err());
        assert!(parse_frequency(".5").is_err());
        assert!(parse_frequency("121.").is_ok());
        assert!(parse_frequency("121.1234567").is_err());
        assert!(parse_frequency("12x.5").is_err());
        assert!(parse_frequency("121.-5").is_err());
    }
}
