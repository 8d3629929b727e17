pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use error::{AppError, AppResult};
pub use services::payment_redactor::PaymentRedactor;
pub use services::sensitive_codec::SensitiveDataCodec;
pub use state::AppState;
pub use utils::crypto::EncryptionKey;
