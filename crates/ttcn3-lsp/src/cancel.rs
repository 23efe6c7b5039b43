use crate::error::HandlerError;
use lsp_server::RequestId;
use lsp_types::NumberOrString;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Flag shared between the dispatch loop and a running request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Canceled)` once the token has been flipped. Handlers call this
    /// between units of work.
    pub fn check(&self) -> Result<(), HandlerError> {
        if self.is_canceled() {
            Err(HandlerError::Canceled)
        } else {
            Ok(())
        }
    }
}

/// Tokens of in-flight requests, keyed by request id.
#[derive(Debug, Default)]
pub struct Cancellation {
    tokens: Mutex<FxHashMap<RequestId, CancelToken>>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` before its request is scheduled.
    pub fn register(&self, id: RequestId) -> CancelToken {
        let token = CancelToken::new();
        self.lock().insert(id, token.clone());
        token
    }

    /// Flips the token of `id`. Returns false when the request is unknown or
    /// already finished.
    pub fn cancel(&self, id: &RequestId) -> bool {
        match self.lock().get(id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn finish(&self, id: &RequestId) {
        self.lock().remove(id);
    }

    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FxHashMap<RequestId, CancelToken>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn request_id(id: NumberOrString) -> RequestId {
    match id {
        NumberOrString::Number(n) => RequestId::from(n),
        NumberOrString::String(s) => RequestId::from(s),
    }
}
