use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::models::decryption::{DecryptReport, Decrypted, FieldOutcome};
use crate::models::payment::{
    SafePaymentProjection, BILLING_ADDRESS_FIELD, DEFAULT_PAYMENT_METHOD, TRANSIT_FIELDS,
};
use crate::services::sensitive_codec::SensitiveDataCodec;
use crate::utils::{card, crypto};

pub use crate::utils::card::{detect_card_type, mask_card_number, CardBrand};

const PROVIDER_KEYS: [&str; 2] = ["paymentProvider", "provider"];
const POSTAL_CODE_KEYS: [&str; 3] = ["postalCode", "zipCode", "zip"];

/// Payment data handling for checkout: encryption for transit and a
/// storage-safe projection. Raw captures are never meant to be persisted.
pub struct PaymentRedactor {
    codec: Arc<SensitiveDataCodec>,
}

impl PaymentRedactor {
    pub fn new(codec: Arc<SensitiveDataCodec>) -> Self {
        Self { codec }
    }

    /// Shallow copy of `capture` with every present, non-empty payment field
    /// replaced by an envelope. Absent fields stay absent.
    pub fn encrypt_for_transit(
        &self,
        capture: &JsonMap<String, JsonValue>,
    ) -> AppResult<JsonMap<String, JsonValue>> {
        let mut transit = capture.clone();

        for field in TRANSIT_FIELDS.iter().copied().chain([BILLING_ADDRESS_FIELD]) {
            let Some(value) = capture.get(field) else {
                continue;
            };
            if is_blank(value) {
                continue;
            }
            let envelope = self.codec.encrypt_value(value)?;
            transit.insert(field.to_string(), JsonValue::String(envelope));
        }

        debug!(target: "vault::payment", fields = transit.len(), "payment encrypted for transit");
        Ok(transit)
    }

    pub fn decrypt_from_transit(
        &self,
        transit: &JsonMap<String, JsonValue>,
    ) -> JsonMap<String, JsonValue> {
        self.decrypt_from_transit_with_report(transit).value
    }

    /// Each field is decrypted on its own; failures are logged and the field
    /// keeps its transit value.
    pub fn decrypt_from_transit_with_report(
        &self,
        transit: &JsonMap<String, JsonValue>,
    ) -> Decrypted<JsonMap<String, JsonValue>> {
        let mut capture = transit.clone();
        let mut report = DecryptReport::default();

        for field in TRANSIT_FIELDS {
            let Some(JsonValue::String(envelope)) = transit.get(field) else {
                continue;
            };
            match crypto::decrypt_text(self.codec.key(), envelope) {
                Ok(plain) => {
                    capture.insert(field.to_string(), JsonValue::String(plain));
                    report.record(FieldOutcome::decrypted(field));
                }
                Err(err) => {
                    warn!(target: "vault::payment", field, error = %err, "payment field left as-is");
                    report.record(FieldOutcome::passed_through(field, err.to_string()));
                }
            }
        }

        if let Some(JsonValue::String(envelope)) = transit.get(BILLING_ADDRESS_FIELD) {
            match self.codec.decrypt_value(envelope) {
                Ok(address) => {
                    capture.insert(BILLING_ADDRESS_FIELD.to_string(), address);
                    report.record(FieldOutcome::decrypted(BILLING_ADDRESS_FIELD));
                }
                Err(err) => {
                    warn!(
                        target: "vault::payment",
                        field = BILLING_ADDRESS_FIELD,
                        error = %err,
                        "payment field left as-is"
                    );
                    report.record(FieldOutcome::passed_through(
                        BILLING_ADDRESS_FIELD,
                        err.to_string(),
                    ));
                }
            }
        }

        Decrypted {
            value: capture,
            report,
        }
    }

    pub fn to_safe_projection(&self, capture: &JsonMap<String, JsonValue>) -> SafePaymentProjection {
        to_safe_projection_at(capture, Utc::now())
    }
}

/// Builds the projection with an explicit capture time.
pub fn to_safe_projection_at(
    capture: &JsonMap<String, JsonValue>,
    captured_at: DateTime<Utc>,
) -> SafePaymentProjection {
    let payment_method = text_field(capture, "paymentMethod")
        .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());
    let payment_provider = PROVIDER_KEYS
        .iter()
        .find_map(|key| text_field(capture, key));

    let mut projection = SafePaymentProjection {
        payment_method,
        payment_provider,
        last4: None,
        masked_card_number: None,
        card_type: None,
        expiry_month: None,
        expiry_year: None,
        billing_country: None,
        billing_postal_code: None,
        captured_at: captured_at.to_rfc3339(),
    };

    if let Some(number) = text_field(capture, "cardNumber") {
        projection.last4 = card::last_four(&number);
        projection.masked_card_number = Some(card::mask_card_number(&number));
        projection.card_type = Some(card::detect_card_type(&number));
    }

    if let Some((month, year)) = expiry_parts(capture) {
        projection.expiry_month = Some(month);
        projection.expiry_year = Some(year);
    }

    if let Some(JsonValue::Object(address)) = capture.get(BILLING_ADDRESS_FIELD) {
        projection.billing_country = text_field(address, "country");
        projection.billing_postal_code = POSTAL_CODE_KEYS
            .iter()
            .find_map(|key| text_field(address, key));
    }

    projection
}

fn expiry_parts(capture: &JsonMap<String, JsonValue>) -> Option<(String, String)> {
    if let (Some(month), Some(year)) = (
        text_field(capture, "expiryMonth"),
        text_field(capture, "expiryYear"),
    ) {
        return Some((month, year));
    }

    let combined = text_field(capture, "expiryDate")?;
    let (month, year) = combined.split_once('/')?;
    let (month, year) = (month.trim(), year.trim());
    if month.is_empty() || year.is_empty() {
        return None;
    }
    Some((month.to_string(), year.to_string()))
}

/// Non-empty string or number, as text.
fn text_field(map: &JsonMap<String, JsonValue>, key: &str) -> Option<String> {
    match map.get(key)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::EncryptionKey;
    use serde_json::json;

    fn redactor() -> PaymentRedactor {
        let key = EncryptionKey::derive_from_secret("payment-tests");
        PaymentRedactor::new(Arc::new(SensitiveDataCodec::new(key)))
    }

    fn object(value: JsonValue) -> JsonMap<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn transit_encrypts_listed_fields_only() {
        let capture = object(json!({
            "paymentMethod": "card",
            "cardNumber": "4111111111111111",
            "cvv": "123",
            "expiryMonth": "07",
            "cardholderName": "",
            "billingAddress": { "street": "1 Main St", "country": "US" }
        }));

        let transit = redactor().encrypt_for_transit(&capture).unwrap();

        assert_eq!(transit["paymentMethod"], "card");
        assert_ne!(transit["cardNumber"], capture["cardNumber"]);
        assert_ne!(transit["cvv"], capture["cvv"]);
        assert!(transit["billingAddress"].is_string());
        assert_eq!(transit["cardholderName"], "");
        assert!(!transit.contains_key("upiId"));
    }

    #[test]
    fn transit_roundtrip_restores_capture() {
        let capture = object(json!({
            "paymentMethod": "card",
            "cardNumber": "4111111111111111",
            "expiryMonth": "07",
            "expiryYear": "2029",
            "billingAddress": { "street": "1 Main St", "zip": "10001" }
        }));
        let redactor = redactor();
        let transit = redactor.encrypt_for_transit(&capture).unwrap();
        let outcome = redactor.decrypt_from_transit_with_report(&transit);

        assert_eq!(outcome.value, capture);
        assert!(!outcome.report.has_failures());
    }

    #[test]
    fn tolerant_decrypt_keeps_bad_field() {
        let transit = object(json!({ "cardNumber": "not-a-valid-envelope", "paymentMethod": "card" }));
        let outcome = redactor().decrypt_from_transit_with_report(&transit);

        assert_eq!(outcome.value["cardNumber"], "not-a-valid-envelope");
        assert_eq!(outcome.report.passed_through_paths(), vec!["cardNumber"]);
    }

    #[test]
    fn projection_with_combined_expiry() {
        let capture = object(json!({
            "paymentMethod": "card",
            "provider": "stripe",
            "cardNumber": "6011 0000 0000 0004",
            "cvv": "999",
            "expiryDate": "09/27",
            "billingAddress": { "street": "1 Main St", "city": "X", "country": "US", "postalCode": "94016" }
        }));
        let at = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z").unwrap().with_timezone(&Utc);

        let projection = to_safe_projection_at(&capture, at);

        assert_eq!(projection.payment_provider.as_deref(), Some("stripe"));
        assert_eq!(projection.last4.as_deref(), Some("0004"));
        assert_eq!(projection.masked_card_number.as_deref(), Some("•••• •••• •••• 0004"));
        assert_eq!(projection.card_type, Some(card::CardBrand::Discover));
        assert_eq!(projection.expiry_month.as_deref(), Some("09"));
        assert_eq!(projection.expiry_year.as_deref(), Some("27"));
        assert_eq!(projection.billing_country.as_deref(), Some("US"));
        assert_eq!(projection.billing_postal_code.as_deref(), Some("94016"));
        assert_eq!(projection.captured_at, "2026-01-02T03:04:05+00:00");
    }

    #[test]
    fn projection_omits_missing_fields() {
        let projection = redactor().to_safe_projection(&object(json!({ "upiId": "me@upi" })));
        let serialized = serde_json::to_value(&projection).unwrap();
        let keys: Vec<&String> = serialized.as_object().unwrap().keys().collect();

        assert_eq!(keys, vec!["paymentMethod", "capturedAt"]);
        assert_eq!(serialized["paymentMethod"], "unknown");
    }

    #[test]
    fn malformed_expiry_is_skipped() {
        let projection =
            to_safe_projection_at(&object(json!({ "expiryDate": "0927" })), Utc::now());
        assert!(projection.expiry_month.is_none());
        assert!(projection.expiry_year.is_none());
    }
}
