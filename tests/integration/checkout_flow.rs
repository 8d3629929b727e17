// Checkout flow: capture -> transit envelope + safe projection -> processor decrypt

use serde_json::{json, Value as JsonValue};
use storefront_vault_lib::config::{KeySource, VaultConfig};
use storefront_vault_lib::AppState;

fn setup_state() -> AppState {
    let config = VaultConfig::from_lookup(|name| match name {
        "APP_SECRET" => Some("checkout-flow-secret".to_string()),
        _ => None,
    })
    .expect("config");
    AppState::new(config).expect("state")
}

#[test]
fn test_checkout_capture_split() {
    let state = setup_state();
    let payments = state.payments();

    let capture = json!({
        "paymentMethod": "card",
        "provider": "stripe",
        "cardNumber": "3782-822463-10005",
        "cvv": "1234",
        "cardholderName": "Grace Hopper",
        "expiryDate": "04/28",
        "billingAddress": { "street": "1 Navy Yard", "country": "US", "postalCode": "20374" }
    });
    let capture = capture.as_object().cloned().expect("object");

    let transit = payments.encrypt_for_transit(&capture).expect("transit");
    let projection = payments.to_safe_projection(&capture);

    // Nothing sensitive survives in the transit object in clear.
    let transit_text = JsonValue::Object(transit.clone()).to_string();
    for secret in ["3782-822463-10005", "Grace Hopper", "1 Navy Yard", "04/28"] {
        assert!(!transit_text.contains(secret), "{secret} visible in transit");
    }
    assert_ne!(transit["cvv"], "1234");
    assert_eq!(transit["provider"], "stripe");

    assert_eq!(projection.masked_card_number.as_deref(), Some("•••• •••• ••• 0005"));
    assert_eq!(projection.card_type.map(|brand| brand.as_str()), Some("Amex"));
    assert_eq!(projection.expiry_month.as_deref(), Some("04"));
    assert_eq!(projection.expiry_year.as_deref(), Some("28"));

    // Server side, just before calling the processor.
    let restored = payments.decrypt_from_transit(&transit);
    assert_eq!(restored, capture);
}

#[test]
fn test_same_secret_shares_envelopes_across_states() {
    let sender = setup_state();
    let receiver = setup_state();

    let encrypted = sender
        .codec()
        .encrypt_tree(&json!({ "phone": "5550000" }))
        .expect("encrypt");

    assert_eq!(receiver.codec().decrypt_tree(&encrypted)["phone"], "5550000");
}

#[test]
fn test_startup_without_key_material_fails() {
    let result = VaultConfig::from_lookup(|_| None);
    assert!(result.expect_err("missing key").is_fatal());

    let bad = AppState::new(VaultConfig::new(KeySource::Explicit("x".repeat(31))));
    assert!(bad.is_err());
}
