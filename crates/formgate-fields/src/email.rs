//! Email address syntax
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}$"
    )
    .unwrap();
}

/// Whether `address` is a syntactically valid single address.
pub fn is_valid(address: &str) -> bool {
    address.len() <= 254 && EMAIL.is_match(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid("ada@example.com"));
        assert!(is_valid("first.last+tag@mail.example.org"));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(!is_valid(""));
        assert!(!is_valid("ada"));
        assert!(!is_valid("ada@"));
        assert!(!is_valid("ada@localhost"));
        assert!(!is_valid("a b@example.com"));
        assert!(!is_valid("ada@example.com\nBcc: x@y.com"));
    }
}
