//! Shared handler state.

use std::sync::{Arc, Mutex};

use minisaml_protocol::{OutstandingRequests, SignatureVerificationPolicy};

use crate::config::{IdpConfig, SpConfig};

/// State shared by IdP handlers.
#[derive(Clone)]
pub struct IdpState {
    inner: Arc<IdpStateInner>,
}

struct IdpStateInner {
    config: IdpConfig,
    policy: SignatureVerificationPolicy,
    cert_body: Option<String>,
}

impl IdpState {
    /// Creates IdP state; the certificate body, when configured, is loaded
    /// once here rather than per request.
    pub fn new(config: IdpConfig, cert_body: Option<String>) -> Self {
        Self {
            inner: Arc::new(IdpStateInner {
                config,
                policy: SignatureVerificationPolicy::Disabled,
                cert_body,
            }),
        }
    }

    pub fn config(&self) -> &IdpConfig {
        &self.inner.config
    }

    pub fn policy(&self) -> SignatureVerificationPolicy {
        self.inner.policy
    }

    pub fn cert_body(&self) -> Option<&str> {
        self.inner.cert_body.as_deref()
    }
}

/// State shared by SP handlers.
#[derive(Clone)]
pub struct SpState {
    inner: Arc<SpStateInner>,
}

struct SpStateInner {
    config: SpConfig,
    policy: SignatureVerificationPolicy,
    outstanding: Mutex<OutstandingRequests>,
}

impl SpState {
    pub fn new(config: SpConfig) -> Self {
        Self {
            inner: Arc::new(SpStateInner {
                config,
                policy: SignatureVerificationPolicy::Disabled,
                outstanding: Mutex::new(OutstandingRequests::new()),
            }),
        }
    }

    pub fn config(&self) -> &SpConfig {
        &self.inner.config
    }

    pub fn policy(&self) -> SignatureVerificationPolicy {
        self.inner.policy
    }

    /// Runs `f` with the outstanding-request store locked.
    pub fn with_outstanding<T>(&self, f: impl FnOnce(&mut OutstandingRequests) -> T) -> T {
        let mut guard = self
            .inner
            .outstanding
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}
