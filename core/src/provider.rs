//! Token providers.
//!
//! # Design
//! A provider owns at most one current token. `get_token` returns it while
//! it is valid and only then goes out to fetch a new one; `fetch_token` and
//! `refresh_token` always produce a new token and store it. The client calls
//! `get_token` exactly once per provider per request and never caches tokens
//! itself, so any cross-call state lives here.
//!
//! `ManagedTokenProvider` handles storage and fetch serialization for any
//! `TokenSource`, leaving the source to implement only the acquisition calls.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::BoxError;
use crate::token::Token;

/// Supplies and renews the token for one header field.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The token currently held, valid or not.
    fn current_token(&self) -> Option<Token>;

    /// The current token if it is valid, otherwise a freshly fetched one.
    async fn get_token(&self) -> Result<Token, BoxError> {
        match self.current_token() {
            Some(token) if token.is_valid() => Ok(token),
            _ => self.fetch_token().await,
        }
    }

    /// Obtain a brand-new token and store it.
    async fn fetch_token(&self) -> Result<Token, BoxError>;

    /// Obtain a new token using the current one as context, and store it.
    async fn refresh_token(&self) -> Result<Token, BoxError>;
}

/// Provider for a credential that never changes, such as an API key.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: Token,
}

impl StaticTokenProvider {
    pub fn new(token: Token) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    fn current_token(&self) -> Option<Token> {
        Some(self.token.clone())
    }

    async fn fetch_token(&self) -> Result<Token, BoxError> {
        Ok(self.token.clone())
    }

    async fn refresh_token(&self) -> Result<Token, BoxError> {
        Ok(self.token.clone())
    }
}

/// The acquisition half of a provider: where new tokens come from.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// First acquisition, e.g. a client-credentials grant.
    async fn fetch(&self) -> Result<Token, BoxError>;

    /// Renewal from `current`, e.g. a refresh-token grant.
    ///
    /// Sources without a separate renewal flow fetch again.
    async fn refresh(&self, current: &Token) -> Result<Token, BoxError> {
        let _ = current;
        self.fetch().await
    }
}

/// `TokenProvider` that stores whatever its `TokenSource` hands out.
///
/// Fetches and refreshes are serialized: concurrent `get_token` calls that
/// find no valid token wait for a single fetch instead of each starting one.
pub struct ManagedTokenProvider<S> {
    source: S,
    token: RwLock<Option<Token>>,
    gate: Mutex<()>,
}

impl<S: TokenSource> ManagedTokenProvider<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            token: RwLock::new(None),
            gate: Mutex::new(()),
        }
    }

    /// Start from an already known token.
    pub fn with_token(source: S, token: Token) -> Self {
        Self {
            source,
            token: RwLock::new(Some(token)),
            gate: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Drop the stored token so the next `get_token` fetches.
    pub fn invalidate(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn store(&self, token: Token) -> Token {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        token
    }

    fn valid_token(&self) -> Option<Token> {
        self.current_token().filter(Token::is_valid)
    }
}

#[async_trait]
impl<S: TokenSource> TokenProvider for ManagedTokenProvider<S> {
    fn current_token(&self) -> Option<Token> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn get_token(&self) -> Result<Token, BoxError> {
        if let Some(token) = self.valid_token() {
            return Ok(token);
        }
        let _gate = self.gate.lock().await;
        // Another caller may have fetched while we waited on the gate.
        if let Some(token) = self.valid_token() {
            return Ok(token);
        }
        debug!("no valid token held, fetching");
        let token = self.source.fetch().await?;
        Ok(self.store(token))
    }

    async fn fetch_token(&self) -> Result<Token, BoxError> {
        let _gate = self.gate.lock().await;
        let token = self.source.fetch().await?;
        Ok(self.store(token))
    }

    async fn refresh_token(&self) -> Result<Token, BoxError> {
        let _gate = self.gate.lock().await;
        let token = match self.current_token() {
            Some(current) => self.source.refresh(&current).await?,
            None => self.source.fetch().await?,
        };
        Ok(self.store(token))
    }
}
