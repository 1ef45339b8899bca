//! Destination redaction for log output.

/// Mask the middle of a phone-number-like destination, keeping the first
/// three and last two characters: `+919876543210` -> `+91********10`.
///
/// Destinations too short to redact meaningfully are fully masked.
pub fn redact_destination(destination: &str) -> String {
    let chars: Vec<char> = destination.chars().collect();
    if chars.len() <= 6 {
        return "*".repeat(chars.len());
    }

    let mut out = String::with_capacity(chars.len());
    out.extend(&chars[..3]);
    out.extend(std::iter::repeat('*').take(chars.len() - 5));
    out.extend(&chars[chars.len() - 2..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_destination_keeps_prefix_and_suffix() {
        assert_eq!(redact_destination("+919876543210"), "+91********10");
    }

    #[test]
    fn short_destination_is_fully_masked() {
        assert_eq!(redact_destination("12345"), "*****");
    }

    #[test]
    fn empty_destination_stays_empty() {
        assert_eq!(redact_destination(""), "");
    }
}
