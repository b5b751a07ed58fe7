//! # ConvertKit API
//!
//! A Rust client for the Kit (formerly ConvertKit) REST API, with OAuth 2.0
//! PKCE authorization, automatic token refresh, and a persistent cache of
//! account-level collections.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ConvertKitConfig`] and [`ConvertKitConfigBuilder`]
//! - Validated newtypes for client IDs, legacy API credentials and URLs
//! - OAuth 2.0 authorization code flow with PKCE via [`auth::oauth`]
//! - An async [`ApiClient`] with rate-limit retry and expired-token refresh
//! - A uniform [`ApiError`] carrying a stable code, a message and the HTTP status
//! - [`resources::ResourceCache`], a time-expiring mirror of forms, landing
//!   pages, tags, sequences, custom fields, posts and products
//! - A pluggable [`store::KeyValueStore`] for everything that must persist
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use convertkit_api::{ApiClient, ClientId, ConvertKitConfig, Credentials, HostUrl};
//! use convertkit_api::store::MemoryStore;
//!
//! let config = ConvertKitConfig::builder()
//!     .client_id(ClientId::new("your-client-id").unwrap())
//!     .redirect_uri(HostUrl::new("https://example.com/oauth/callback").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let client = ApiClient::new(
//!     config,
//!     Credentials::oauth("access-token", "refresh-token"),
//!     Arc::new(MemoryStore::new()),
//! )
//! .unwrap();
//! ```
//!
//! ## OAuth Authorization
//!
//! ```rust,ignore
//! // Step 1: send the user to Kit. The PKCE verifier is kept in the store.
//! let url = client.get_oauth_url(Some("https://example.com/settings"), None)?;
//!
//! // Step 2: exchange the code Kit redirected back with.
//! let tokens = client.get_access_token(&code).await?;
//! ```
//!
//! ## Persisting Refreshed Tokens
//!
//! ```rust,ignore
//! use convertkit_api::{TokenObserver, TokenRefresh};
//!
//! struct SaveTokens;
//!
//! impl TokenObserver for SaveTokens {
//!     fn on_token_refresh(&self, refresh: &TokenRefresh) {
//!         save(&refresh.current);
//!     }
//! }
//!
//! let client = client.with_token_observer(Arc::new(SaveTokens));
//! ```
//!
//! ## Cached Resources
//!
//! ```rust,ignore
//! use convertkit_api::resources::{ResourceCache, Tags};
//!
//! let tags = ResourceCache::<Tags>::new(Arc::new(client));
//! tags.init().await?;
//! let page = tags.get_paginated_subset(1, 25);
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration, credentials and storage are passed explicitly
//! - **Fail-fast validation**: newtypes validate on construction and
//!   endpoint inputs are checked before any request is sent
//! - **Thread-safe**: all public types are `Send + Sync`
//! - **Async-first**: designed for use with the Tokio runtime

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod resources;
pub mod store;

// Re-export public types at crate root for convenience
pub use auth::{Credentials, TokenObserver, TokenPair, TokenRefresh};
pub use config::{
    ApiKey, ApiSecret, ApiVersion, ClientId, ConvertKitConfig, ConvertKitConfigBuilder,
    Environment, HostUrl,
};
pub use error::ConfigError;

// Re-export client types
pub use clients::{ApiClient, ApiError, ValidationError};
