pub mod payment_redactor;
pub mod sensitive_codec;
