pub mod decryption;
pub mod payment;
