//! REST API client module for the banking service.
//!
//! This module provides the `BankingClient` for login, balance,
//! transfer, deposit and chat calls, and the `Transport` seam it sends
//! requests through.
//!
//! The API uses bearer token authentication; the token comes from the
//! session store and is attached to every request when present.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{auth_headers, BankingClient};
pub use error::ApiError;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
