//! Client library for the Bank of Anthos chat agent API.
//!
//! - `session`: persisted auth token, user id and account id
//! - `api`: typed HTTP client with bearer-token attachment
//! - `models`: request/response types and the chat transcript
//! - `guard`: single in-flight submission guard
//! - `config`: on-disk application configuration

pub mod api;
pub mod config;
pub mod guard;
pub mod models;
pub mod session;
pub mod utils;

#[cfg(test)]
mod testing;

pub use api::{ApiError, BankingClient};
pub use config::Config;
pub use guard::{InFlightGuard, InFlightTicket};
pub use session::{Session, SessionKey, SessionStore};
