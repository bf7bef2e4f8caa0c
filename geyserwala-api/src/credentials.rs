//! Password sources resolved at login time
//!
//! The device password does not have to be known when the client is built.
//! Anything implementing [`CredentialProvider`] is asked for it each time a
//! login happens, so a secret can come from a keyring, a prompt or an async
//! vault lookup.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

/// A deferred source of the device password
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn resolve(&self) -> String;
}

#[async_trait]
impl CredentialProvider for String {
    async fn resolve(&self) -> String {
        self.clone()
    }
}

#[async_trait]
impl CredentialProvider for &'static str {
    async fn resolve(&self) -> String {
        (*self).to_string()
    }
}

/// Password computed by a synchronous closure at login time
pub struct FnCredential<F>(F);

impl<F> FnCredential<F>
where
    F: Fn() -> String + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> CredentialProvider for FnCredential<F>
where
    F: Fn() -> String + Send + Sync,
{
    async fn resolve(&self) -> String {
        (self.0)()
    }
}

type PasswordFuture = Pin<Box<dyn Future<Output = String> + Send>>;

/// Password produced by an async closure at login time
pub struct AsyncFnCredential {
    f: Box<dyn Fn() -> PasswordFuture + Send + Sync>,
}

impl AsyncFnCredential {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        Self {
            f: Box::new(move || Box::pin(f())),
        }
    }
}

#[async_trait]
impl CredentialProvider for AsyncFnCredential {
    async fn resolve(&self) -> String {
        (self.f)().await
    }
}

/// Shared handle to a credential provider
///
/// Debug output never shows the secret.
#[derive(Clone)]
pub struct Password(Arc<dyn CredentialProvider>);

impl Password {
    pub fn new(provider: impl CredentialProvider + 'static) -> Self {
        Self(Arc::new(provider))
    }

    /// Password from a synchronous closure
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::new(FnCredential::new(f))
    }

    /// Password from an async closure
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        Self::new(AsyncFnCredential::new(f))
    }

    pub async fn resolve(&self) -> String {
        self.0.resolve().await
    }
}

impl Default for Password {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}
