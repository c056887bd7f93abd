//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! # Design Principles
//!
//! 1. **Pre-compute expensive resources**: JWT keys, DB pools are created once
//! 2. **Cheap cloning**: All fields use Arc or are already Clone-cheap
//! 3. **Immutable after creation**: State is read-only during request handling

use crate::auth::JwtService;
use crate::config::AppConfig;
use crate::repositories::{UserRepository, UserStore};
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state
///
/// # Performance
///
/// - `users`: trait object behind Arc, cloning is O(1)
/// - `config`: Wrapped in Arc, cloning is O(1)
/// - `jwt`: Pre-computed keys wrapped in Arc, cloning is O(1)
#[derive(Clone)]
pub struct AppState {
    /// User directory
    pub users: Arc<dyn UserStore>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Pre-initialized JWT service with cached keys
    pub jwt: JwtService,
    /// Prometheus exporter handle, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create application state backed by PostgreSQL
    ///
    /// # Errors
    /// Fails when the JWT configuration is unusable. This is a startup
    /// failure, never a per-request one.
    pub fn new(db: PgPool, config: AppConfig) -> Result<Self> {
        Self::with_store(Arc::new(UserRepository::new(db)), config)
    }

    /// Create application state over any user store
    pub fn with_store(users: Arc<dyn UserStore>, config: AppConfig) -> Result<Self> {
        // Pre-compute JWT service with cached keys
        let jwt = JwtService::new(
            config.jwt.secret.expose_secret(),
            config.jwt.token_expiry_secs,
        )?;

        Ok(Self {
            users,
            config: Arc::new(config),
            jwt,
            metrics: None,
        })
    }

    /// Attach an installed Prometheus recorder
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get a reference to the user store
    #[inline]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the JWT service
    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }
}
