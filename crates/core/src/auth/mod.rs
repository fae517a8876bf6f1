//! Authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - The minimum password policy

mod password;

pub use password::{
    MIN_PASSWORD_LEN, PasswordError, hash_password, validate_password_strength, verify_password,
};
