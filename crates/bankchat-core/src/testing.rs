//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture, FutureExt};
use reqwest::StatusCode;

use crate::api::{ApiError, ApiRequest, ApiResponse, BankingClient, Transport};
use crate::session::{KeyValueStore, MemoryStore, SessionStore, StorageError};

#[derive(Default)]
struct MockState {
    responses: VecDeque<Result<ApiResponse, String>>,
    requests: Vec<ApiRequest>,
}

/// Transport that records every request and replays queued responses.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, status: StatusCode, body: &str) {
        self.state.lock().unwrap().responses.push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub(crate) fn fail_network(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Err(message.to_string()));
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, ApiError>> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request);
        let next = state
            .responses
            .pop_front()
            .unwrap_or_else(|| Err("no response queued".to_string()));
        future::ready(next.map_err(ApiError::Network)).boxed()
    }
}

/// Client over `transport` with an in-memory session
pub(crate) fn client_with(transport: MockTransport) -> (BankingClient, SessionStore) {
    let session = SessionStore::new(Arc::new(MemoryStore::new()));
    (BankingClient::new(Arc::new(transport), session.clone()), session)
}

/// Client whose session backend fails every operation
pub(crate) fn client_with_failing_store(transport: MockTransport) -> BankingClient {
    let session = SessionStore::new(Arc::new(FailingStore::default()));
    BankingClient::new(Arc::new(transport), session)
}

#[derive(Default, Clone, Copy)]
enum FailureMode {
    #[default]
    Everything,
    Removals,
    /// Writes succeed until this many have gone through
    WritesAfter(usize),
}

/// Memory-backed store that fails on demand and counts reads.
#[derive(Default)]
pub(crate) struct FailingStore {
    inner: MemoryStore,
    mode: FailureMode,
    writes: AtomicUsize,
    reads: AtomicUsize,
}

impl FailingStore {
    /// Only `remove_all` fails
    pub(crate) fn failing_removals() -> Self {
        Self {
            mode: FailureMode::Removals,
            ..Self::default()
        }
    }

    /// The first `ok` writes succeed, every later one fails
    pub(crate) fn failing_writes_after(ok: usize) -> Self {
        Self {
            mode: FailureMode::WritesAfter(ok),
            ..Self::default()
        }
    }

    /// A store that never fails, for counting reads
    pub(crate) fn reliable() -> Self {
        Self {
            mode: FailureMode::WritesAfter(usize::MAX),
            ..Self::default()
        }
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn error(key: &str) -> StorageError {
        StorageError::Read {
            key: key.to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        }
    }
}

impl KeyValueStore for FailingStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            FailureMode::Everything => future::ready(Err(Self::error(key))).boxed(),
            _ => self.inner.get(key),
        }
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        let done = self.writes.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            FailureMode::Removals => self.inner.set(key, value),
            FailureMode::WritesAfter(ok) if done < ok => self.inner.set(key, value),
            _ => future::ready(Err(Self::error(key))).boxed(),
        }
    }

    fn remove_all<'a>(&'a self, keys: &'a [&'a str]) -> BoxFuture<'a, Result<(), StorageError>> {
        match self.mode {
            FailureMode::WritesAfter(_) => self.inner.remove_all(keys),
            _ => future::ready(Err(Self::error(&keys.join(",")))).boxed(),
        }
    }
}
