//! Service provider registry.
//!
//! The IdP serves multiple SPs; each incoming AuthnRequest is routed by its
//! Issuer to the matching registration. Registrations are loaded once at
//! startup (typically from the `SERVICE_PROVIDERS` JSON list) and the
//! registry is immutable afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{SamlError, SamlResult};

/// A registered service provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProviderRecord {
    /// SP entity ID, the routing key.
    pub entity_id: String,

    /// ACS URL responses are posted to.
    pub callback_url: String,

    /// Path the SP's metadata descriptor is served or written to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_path: Option<String>,

    /// Path to the SP's private key, unused while signing is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<String>,

    /// Path to the SP's public certificate, unused while signing is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_cert_path: Option<String>,
}

impl ServiceProviderRecord {
    /// Creates a minimal registration.
    #[must_use]
    pub fn new(entity_id: impl Into<String>, callback_url: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            callback_url: callback_url.into(),
            metadata_path: None,
            private_key_path: None,
            public_cert_path: None,
        }
    }
}

/// Issuer-keyed collection of registered service providers.
#[derive(Debug, Clone, Default)]
pub struct SpRegistry {
    providers: HashMap<String, ServiceProviderRecord>,
    order: Vec<String>,
}

impl SpRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a list of records.
    ///
    /// Later records with a duplicate entity ID replace earlier ones.
    #[must_use]
    pub fn from_records(records: Vec<ServiceProviderRecord>) -> Self {
        let mut registry = Self::new();
        for record in records {
            registry.register(record);
        }
        registry
    }

    /// Parses the registry from its JSON representation, a list of records.
    pub fn from_json(json: &str) -> SamlResult<Self> {
        let records: Vec<ServiceProviderRecord> = serde_json::from_str(json)
            .map_err(|e| SamlError::InvalidRequest(format!("bad service provider list: {e}")))?;
        Ok(Self::from_records(records))
    }

    /// Registers a service provider.
    pub fn register(&mut self, record: ServiceProviderRecord) {
        info!(entity_id = %record.entity_id, callback_url = %record.callback_url, "registered service provider");
        if !self.providers.contains_key(&record.entity_id) {
            self.order.push(record.entity_id.clone());
        }
        self.providers.insert(record.entity_id.clone(), record);
    }

    /// Looks up a service provider by entity ID.
    pub fn lookup(&self, entity_id: &str) -> SamlResult<&ServiceProviderRecord> {
        self.providers
            .get(entity_id)
            .ok_or_else(|| SamlError::UnknownServiceProvider(entity_id.to_string()))
    }

    /// Iterates registrations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceProviderRecord> {
        self.order.iter().filter_map(|id| self.providers.get(id))
    }

    /// Number of registered service providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no service providers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
