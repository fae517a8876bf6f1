//! Core business logic for Spendbee.
//!
//! This crate contains pure business logic with no web or database
//! dependencies. Handlers load rows, map them into the records defined here,
//! and serialize what comes back.
//!
//! # Modules
//!
//! - `balance` - Per-member balances and settle-up suggestions
//! - `currency` - Exchange rate table, conversion and the cached rate provider
//! - `expense` - Share splitting and expense/settlement validation
//! - `activity` - Activity feed rendering
//! - `export` - CSV export of a group's expenses
//! - `auth` - Password hashing and policy

pub mod activity;
pub mod auth;
pub mod balance;
pub mod currency;
pub mod expense;
pub mod export;
