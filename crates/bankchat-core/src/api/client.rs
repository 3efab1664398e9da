//! API client for the Bank of Anthos chat agent service.
//!
//! This module provides the `BankingClient` struct for login, balance,
//! transfer, deposit and chat calls. Every request goes through the auth
//! header step, which reads the current session and attaches the bearer
//! token when one is stored.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use super::ApiError;
use crate::models::{
    BalanceSnapshot, ChatReply, ChatRequest, Credentials, DepositRequest, LoginResponse,
    TransactionResult, TransferRequest,
};
use crate::session::{Session, SessionStore};

/// Headers to attach for the given session.
///
/// Returns `Authorization: Bearer <token>` when a token is present and
/// nothing otherwise. A token that is not a valid header value is dropped
/// so the request still goes out.
pub fn auth_headers(session: &Session) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(token) = session.auth_token.as_deref() {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
            Err(_) => warn!("Stored auth token is not a valid header value, sending without it"),
        }
    }
    headers
}

/// Typed client for the banking API.
/// Clone is cheap - the transport and session backend are shared.
#[derive(Clone)]
pub struct BankingClient {
    transport: Arc<dyn Transport>,
    session: SessionStore,
}

impl BankingClient {
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self { transport, session }
    }

    /// Client talking HTTP to `base_url`
    pub fn connect(base_url: &str, session: SessionStore) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(base_url)?;
        Ok(Self::new(Arc::new(transport), session))
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let session = Session {
            auth_token: self.session.auth_token().await,
            ..Session::default()
        };
        request.headers.extend(auth_headers(&session));
        self.transport.send(request).await
    }

    fn encode<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
        serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(path: &str, response: ApiResponse) -> Result<T, ApiError> {
        if !response.status.is_success() {
            debug!(status = %response.status, path = path, "Request failed");
            return Err(ApiError::from_status(response.status, &response.body));
        }
        serde_json::from_str(&response.body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let request = ApiRequest::get(segments);
        let path = request.path();
        let response = self.send(request).await?;
        Self::decode(&path, response)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let request = ApiRequest::post(segments, Self::encode(body)?);
        let path = request.path();
        let response = self.send(request).await?;
        Self::decode(&path, response)
    }

    // ===== Operations =====

    /// Authenticate. Any non-2xx answer is an `ApiError::Authentication`.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let request = ApiRequest::post(&["login"], Self::encode(credentials)?);
        let path = request.path();
        let response = self.send(request).await?;

        if !response.status.is_success() {
            warn!(status = %response.status, username = %credentials.username, "Login rejected");
            return Err(ApiError::authentication(response.status, &response.body));
        }

        let login: LoginResponse = Self::decode(&path, response)?;
        info!(user_id = %login.user_id, "Login successful");
        Ok(login)
    }

    /// Log in and persist the returned token, user id and account id.
    ///
    /// If the session cannot be stored in full the store is left logged out
    /// and `ApiError::SessionNotSaved` is returned.
    pub async fn login_and_save(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let login = self.login(credentials).await?;
        if !self.session.save_login(&login).await {
            return Err(ApiError::SessionNotSaved);
        }
        Ok(login)
    }

    pub async fn get_balance(&self, account_id: &str) -> Result<BalanceSnapshot, ApiError> {
        self.get(&["accounts", account_id, "balance"]).await
    }

    /// Transfer money. A declined transfer comes back as `Ok` with a
    /// failure status.
    pub async fn send_transaction(
        &self,
        request: &TransferRequest,
    ) -> Result<TransactionResult, ApiError> {
        let result: TransactionResult = self.post(&["transactions"], request).await?;
        log_outcome("transaction", &result);
        Ok(result)
    }

    /// Deposit money. Same outcome rules as `send_transaction`.
    pub async fn make_deposit(&self, request: &DepositRequest) -> Result<TransactionResult, ApiError> {
        let result: TransactionResult = self.post(&["deposits"], request).await?;
        log_outcome("deposit", &result);
        Ok(result)
    }

    pub async fn send_chat_message(&self, user_id: &str, message: &str) -> Result<ChatReply, ApiError> {
        let request = ChatRequest {
            user_id: user_id.to_string(),
            message: message.to_string(),
        };
        self.post(&["chat"], &request).await
    }
}

fn log_outcome(kind: &str, result: &TransactionResult) {
    if result.is_success() {
        info!(kind = kind, transaction_id = %result.transaction_id, "Completed");
    } else {
        warn!(kind = kind, status = %result.status, message = %result.message, "Declined");
    }
}
