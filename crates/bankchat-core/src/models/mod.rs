//! Data models for the banking API.
//!
//! This module contains the request and response types exchanged with
//! the server:
//!
//! - `Credentials`, `LoginResponse`: login
//! - `BalanceSnapshot`: account balance
//! - `TransferRequest`, `DepositRequest`, `TransactionResult`: money movement
//! - `ChatRequest`, `ChatReply`, `ChatTranscript`: chat assistant

pub mod account;
pub mod auth;
pub mod chat;
pub mod transaction;

pub use account::BalanceSnapshot;
pub use auth::{Credentials, LoginResponse};
pub use chat::{ChatMessage, ChatReply, ChatRequest, ChatTranscript};
pub use transaction::{
    parse_amount, DepositRequest, TransactionResult, TransactionStatus, TransferRequest,
    ValidationError,
};
