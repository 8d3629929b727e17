// Request/response body transformation through the middleware

use serde_json::{json, Value as JsonValue};
use storefront_vault_lib::config::{KeySource, MiddlewareSettings, VaultConfig};
use storefront_vault_lib::AppState;

const JSON: Option<&str> = Some("application/json");

fn setup_state() -> AppState {
    let mut config = VaultConfig::new(KeySource::Explicit(
        "0123456789abcdef0123456789abcdef".to_string(),
    ));
    config.middleware = MiddlewareSettings {
        enabled: true,
        excluded_prefixes: vec!["/api/auth".to_string()],
    };
    AppState::new(config).expect("state")
}

#[test]
fn test_response_then_request_roundtrip() {
    let state = setup_state();
    let middleware = state.middleware();
    let profile = json!({ "user": { "phone": "5551234567", "email": "a@b.com", "bio": "hello" } });

    let wire = middleware
        .encrypt_response("/api/profile", JSON, &profile)
        .expect("encrypt response");
    let on_wire: JsonValue = serde_json::from_slice(&wire).expect("json");
    assert_ne!(on_wire["user"]["phone"], "5551234567");
    assert_eq!(on_wire["user"]["bio"], "hello");

    let inbound = middleware
        .decrypt_request("/api/profile", JSON, &wire)
        .expect("decrypt request")
        .expect("route is handled");
    assert_eq!(inbound.value, profile);
    assert_eq!(inbound.report.decrypted_paths(), vec!["user.phone"]);
}

#[test]
fn test_excluded_route_is_untouched() {
    let state = setup_state();
    let middleware = state.middleware();
    let body = json!({ "password": "hunter2" });

    let wire = middleware
        .encrypt_response("/api/auth/callback", JSON, &body)
        .expect("serialize");
    assert_eq!(serde_json::from_slice::<JsonValue>(&wire).expect("json"), body);

    let inbound = middleware
        .decrypt_request("/api/auth/callback", JSON, &wire)
        .expect("no error");
    assert!(inbound.is_none());
}

#[test]
fn test_plain_client_body_is_tolerated() {
    let state = setup_state();
    let body = br#"{"phone":"5551234567","items":[{"sku":"A"}]}"#;

    let inbound = state
        .middleware()
        .decrypt_request("/api/cart", JSON, body)
        .expect("decrypt")
        .expect("handled");

    assert_eq!(inbound.value["phone"], "5551234567");
    assert_eq!(inbound.report.passed_through_paths(), vec!["phone"]);
}
