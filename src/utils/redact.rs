use serde_json::{Map as JsonMap, Value as JsonValue};

/// Lower-case fragments that mark a key as sensitive. Matching is
/// substring-contains, so `userAddressHistory` is caught by `address`.
pub const SENSITIVE_KEYWORDS: [&str; 22] = [
    "password",
    "passwd",
    "secret",
    "token",
    "apikey",
    "api_key",
    "privatekey",
    "private_key",
    "cardnumber",
    "card_number",
    "cvv",
    "cvc",
    "expiry",
    "accountnumber",
    "account_number",
    "routingnumber",
    "routing_number",
    "iban",
    "ssn",
    "taxid",
    "address",
    "phone",
];

const REDACTED: &str = "[REDACTED]";

pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

/// Log-safe copy of a payload: sensitive string leaves become `[REDACTED]`.
pub fn redact_sensitive_data(data: &JsonValue) -> JsonValue {
    match data {
        JsonValue::Object(map) => {
            let mut redacted_map = JsonMap::with_capacity(map.len());
            for (key, val) in map {
                let redacted_val = match val {
                    JsonValue::String(s) if is_sensitive_key(key) && !s.is_empty() => {
                        JsonValue::String(REDACTED.to_string())
                    }
                    _ => redact_sensitive_data(val),
                };
                redacted_map.insert(key.clone(), redacted_val);
            }
            JsonValue::Object(redacted_map)
        }
        JsonValue::Array(arr) => JsonValue::Array(arr.iter().map(redact_sensitive_data).collect()),
        _ => data.clone(),
    }
}
