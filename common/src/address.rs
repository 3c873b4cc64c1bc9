//! Free-text address splitting
//!
//! The find file holds one address line, the form wants street, postcode
//! and place separately. Best effort, lossy by nature.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressParts {
    pub street: String,
    pub postal_code: String,
    pub place: String,
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Splits `"<street>, <postcode> <place>"`.
///
/// - last comma separates street from the rest
/// - the rest splits at its first space into a numeric postcode and the place
/// - a numeric rest is postcode only, anything else is place only
/// - without a comma the whole string is the street, unless it is all digits
pub fn parse_combined_address(text: &str) -> AddressParts {
    let text = text.trim();

    let Some((street, rest)) = text.rsplit_once(',') else {
        if is_all_digits(text) {
            return AddressParts {
                postal_code: text.to_string(),
                ..Default::default()
            };
        }
        return AddressParts {
            street: text.to_string(),
            ..Default::default()
        };
    };

    let street = street.trim().to_string();
    let rest = rest.trim();

    if let Some((code, place)) = rest.split_once(' ') {
        if is_all_digits(code) {
            return AddressParts {
                street,
                postal_code: code.to_string(),
                place: place.trim().to_string(),
            };
        }
    }

    if is_all_digits(rest) {
        AddressParts {
            street,
            postal_code: rest.to_string(),
            place: String::new(),
        }
    } else {
        AddressParts {
            street,
            postal_code: String::new(),
            place: rest.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(street: &str, postal_code: &str, place: &str) -> AddressParts {
        AddressParts {
            street: street.into(),
            postal_code: postal_code.into(),
            place: place.into(),
        }
    }

    #[test]
    fn test_full_address() {
        assert_eq!(
            parse_combined_address("Storgata 5, 5073 BERGEN"),
            parts("Storgata 5", "5073", "BERGEN")
        );
    }

    #[test]
    fn test_street_only() {
        assert_eq!(parse_combined_address("Storgata 5"), parts("Storgata 5", "", ""));
    }

    #[test]
    fn test_digits_without_comma() {
        assert_eq!(parse_combined_address("5073"), parts("", "5073", ""));
    }

    #[test]
    fn test_postcode_only_remainder() {
        assert_eq!(parse_combined_address("X, 5073"), parts("X", "5073", ""));
    }

    #[test]
    fn test_place_only_remainder() {
        assert_eq!(parse_combined_address("Storgata 5, Bergen"), parts("Storgata 5", "", "Bergen"));
        assert_eq!(
            parse_combined_address("Gården, Øvre Eiker"),
            parts("Gården", "", "Øvre Eiker")
        );
    }

    #[test]
    fn test_splits_at_last_comma() {
        assert_eq!(
            parse_combined_address("c/o Hansen, Storgata 5, 0155 OSLO"),
            parts("c/o Hansen, Storgata 5", "0155", "OSLO")
        );
    }

    #[test]
    fn test_multi_word_place() {
        assert_eq!(
            parse_combined_address("Vegen 1, 3400 LIER  SENTRUM"),
            parts("Vegen 1", "3400", "LIER  SENTRUM")
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse_combined_address(""), AddressParts::default());
        assert_eq!(parse_combined_address("   "), AddressParts::default());
    }
}
