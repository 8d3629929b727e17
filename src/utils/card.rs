use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

const MASK_CHAR: char = '•';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Diners,
    Jcb,
    UnionPay,
    Maestro,
    Unknown,
}

impl CardBrand {
    pub fn as_str(self) -> &'static str {
        match self {
            CardBrand::Visa => "Visa",
            CardBrand::Mastercard => "Mastercard",
            CardBrand::Amex => "Amex",
            CardBrand::Discover => "Discover",
            CardBrand::Diners => "Diners",
            CardBrand::Jcb => "JCB",
            CardBrand::UnionPay => "UnionPay",
            CardBrand::Maestro => "Maestro",
            CardBrand::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CardBrand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Prefix ranges overlap (Maestro's `^6` covers Discover and UnionPay), so the
// first match in table order wins.
static BRAND_PATTERNS: Lazy<Vec<(CardBrand, Regex)>> = Lazy::new(|| {
    [
        (CardBrand::Visa, r"^4"),
        (CardBrand::Mastercard, r"^5[1-5]|^2[2-7]"),
        (CardBrand::Amex, r"^3[47]"),
        (CardBrand::Discover, r"^6011|^65|^64[4-9]|^622"),
        (CardBrand::Diners, r"^36|^38|^30[0-5]"),
        (CardBrand::Jcb, r"^35"),
        (CardBrand::UnionPay, r"^62"),
        (CardBrand::Maestro, r"^5[0678]|^6"),
    ]
    .into_iter()
    .filter_map(|(brand, pattern)| Regex::new(pattern).ok().map(|re| (brand, re)))
    .collect()
});

fn strip_separators(card_number: &str) -> String {
    card_number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Digits only, used for the stored `last4`.
pub fn last_four(card_number: &str) -> Option<String> {
    let cleaned = strip_separators(card_number);
    let chars: Vec<char> = cleaned.chars().collect();
    if chars.len() < 4 {
        return None;
    }
    Some(chars[chars.len() - 4..].iter().collect())
}

/// `4111 1111 1111 1111` becomes `•••• •••• •••• 1111`.
pub fn mask_card_number(card_number: &str) -> String {
    let cleaned = strip_separators(card_number);
    let chars: Vec<char> = cleaned.chars().collect();

    if chars.len() < 4 {
        return chars
            .iter()
            .map(|c| if c.is_ascii_digit() { MASK_CHAR } else { *c })
            .collect();
    }

    let (head, tail) = chars.split_at(chars.len() - 4);
    let tail: String = tail.iter().collect();
    if head.is_empty() {
        return tail;
    }

    let masked: Vec<char> = head
        .iter()
        .map(|c| if c.is_ascii_digit() { MASK_CHAR } else { *c })
        .collect();
    let grouped = masked
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ");

    format!("{grouped} {tail}")
}

pub fn detect_card_type(card_number: &str) -> CardBrand {
    let cleaned = strip_separators(card_number);
    BRAND_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&cleaned))
        .map(|(brand, _)| *brand)
        .unwrap_or(CardBrand::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_sixteen_digit_number() {
        assert_eq!(mask_card_number("4111111111111111"), "•••• •••• •••• 1111");
        assert_eq!(mask_card_number("4111-1111 1111-1111"), "•••• •••• •••• 1111");
    }

    #[test]
    fn masks_amex_length() {
        assert_eq!(mask_card_number("378282246310005"), "•••• •••• ••• 0005");
    }

    #[test]
    fn short_inputs() {
        assert_eq!(mask_card_number("1234"), "1234");
        assert_eq!(mask_card_number("12345"), "• 2345");
        assert_eq!(mask_card_number("123"), "•••");
        assert_eq!(mask_card_number(""), "");
    }

    #[test]
    fn detects_brands_in_table_order() {
        let cases = [
            ("4111111111111111", CardBrand::Visa),
            ("5555555555554444", CardBrand::Mastercard),
            ("2223003122003222", CardBrand::Mastercard),
            ("378282246310005", CardBrand::Amex),
            ("6011000000000000", CardBrand::Discover),
            ("6221260000000000", CardBrand::Discover),
            ("30569309025904", CardBrand::Diners),
            ("3530111333300000", CardBrand::Jcb),
            ("6200000000000005", CardBrand::UnionPay),
            ("5018000000000009", CardBrand::Maestro),
            ("6759649826438453", CardBrand::Maestro),
            ("1234567890123456", CardBrand::Unknown),
            ("", CardBrand::Unknown),
        ];
        for (number, expected) in cases {
            assert_eq!(detect_card_type(number), expected, "{number}");
        }
    }

    #[test]
    fn detection_ignores_separators() {
        assert_eq!(detect_card_type("4111 1111-1111 1111"), CardBrand::Visa);
    }

    #[test]
    fn brand_serializes_as_display_name() {
        assert_eq!(serde_json::to_string(&CardBrand::Jcb).unwrap(), "\"JCB\"");
        assert_eq!(CardBrand::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn last_four_requires_four_characters() {
        assert_eq!(last_four("4111 1111 1111 1111").as_deref(), Some("1111"));
        assert_eq!(last_four("12"), None);
    }
}
