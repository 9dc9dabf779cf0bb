//! # fileman-auth
//!
//! Credential handling for Files Manager. Passwords are stored only as
//! Argon2id PHC strings.

pub mod password;

pub use password::PasswordHasher;
