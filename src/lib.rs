//! Savings Wallet API Library
//!
//! Savings goals for users sharing one device. Persistence, auth and PIN
//! checks live in an external backend-as-a-service; this crate validates and
//! sanitizes input, sequences the remote calls, and folds fetched rows into
//! the numbers the screens show.
//!
//! # Modules
//!
//! - `aggregation`: Totals, progress and currency formatting.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `forms`: Form inputs, field errors and validation into payloads.
//! - `goals`: Saving goal creation and listing.
//! - `handlers`: HTTP request handlers.
//! - `logging`: Tracing setup and the verbose switch.
//! - `models`: Backend rows and payloads.
//! - `profiles`: User list, profile edits and PIN verification.
//! - `provisioning`: New-user sequence.
//! - `sanitize`: Markup stripping before submission.
//! - `supabase_client`: Backend client.
//! - `transactions`: Recording entries and reading history.
//! - `validation`: Field rules.

pub mod aggregation;
pub mod config;
pub mod errors;
pub mod forms;
pub mod goals;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod profiles;
pub mod provisioning;
pub mod sanitize;
pub mod supabase_client;
pub mod transactions;
pub mod validation;
