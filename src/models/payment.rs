use serde::Serialize;

use crate::utils::card::CardBrand;

/// Scalar payment fields that are encrypted for transit.
pub const TRANSIT_FIELDS: [&str; 13] = [
    "cardNumber",
    "cvv",
    "cvc",
    "securityCode",
    "cardholderName",
    "nameOnCard",
    "expiryDate",
    "expiryMonth",
    "expiryYear",
    "accountNumber",
    "routingNumber",
    "upiId",
    "walletId",
];

/// Nested object encrypted as a single opaque blob.
pub const BILLING_ADDRESS_FIELD: &str = "billingAddress";

pub const DEFAULT_PAYMENT_METHOD: &str = "unknown";

/// Storage-safe view of a payment capture. Never holds the CVV, the full card
/// number or the billing street address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafePaymentProjection {
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_type: Option<CardBrand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_postal_code: Option<String>,
    pub captured_at: String,
}
