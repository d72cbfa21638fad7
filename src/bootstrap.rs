//! Bootstrap sequencer: load the identity runtime, construct, wrap, publish.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs when the provider first sees a configuration, and again whenever
//! the endpoint triple (url, realm, clientId) changes. Tokens stashed before
//! a forced reload are fed back into construction so the user is not sent
//! through login again.
//!
//! TRADE-OFFS
//! ==========
//! The runtime load is shared and never retried: a failed script load keeps
//! failing every later bootstrap on the page, which is what a reload fixes.

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod bootstrap_test;

use std::cell::{Cell, RefCell};

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use serde_json::{Map, Value};

use crate::client::{IdentityClient, WrappedClient, wrap};
use crate::config::{BootstrapKey, SessionConfig};
use crate::error::SessionError;
use crate::stash::{Stash, StorageBackend};

/// Future resolving once the identity runtime is usable.
pub type RuntimeLoad = Shared<LocalBoxFuture<'static, Result<(), SessionError>>>;

/// Makes the identity client's runtime available in the environment.
pub trait RuntimeLoader {
    /// Whether the runtime is already present (bundled, or loaded earlier).
    fn is_available(&self) -> bool;

    /// Start loading the runtime from `script_url`.
    fn load(&self, script_url: &str) -> LocalBoxFuture<'static, Result<(), SessionError>>;
}

/// Builds an identity client from merged construction options.
pub trait ClientFactory {
    type Client: IdentityClient;

    /// # Errors
    ///
    /// Returns [`SessionError::Construct`] when the constructor rejects the
    /// options.
    fn construct(&self, options: &Map<String, Value>) -> Result<Self::Client, SessionError>;
}

/// Deduplicates runtime loads: every caller shares the first in-flight load.
pub struct LoadOnce<L> {
    loader: L,
    in_flight: RefCell<Option<RuntimeLoad>>,
}

impl<L: RuntimeLoader> LoadOnce<L> {
    pub fn new(loader: L) -> Self {
        Self { loader, in_flight: RefCell::new(None) }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Resolve once the runtime is available, loading it at most once.
    pub fn ensure(&self, script_url: &str) -> RuntimeLoad {
        if let Some(load) = self.in_flight.borrow().as_ref() {
            return load.clone();
        }
        if self.loader.is_available() {
            return futures::future::ready(Ok(())).boxed_local().shared();
        }
        tracing::info!(script_url, "loading identity runtime");
        let load = self.loader.load(script_url).shared();
        *self.in_flight.borrow_mut() = Some(load.clone());
        load
    }
}

/// Tracks which bootstrap is current so a superseded one cannot publish.
#[derive(Debug, Default)]
pub struct BootstrapGate {
    key: RefCell<Option<BootstrapKey>>,
    generation: Cell<u64>,
}

impl BootstrapGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bootstrap for `key`. Returns its generation, or `None` if
    /// the same key is already bootstrapped or in progress.
    pub fn begin(&self, key: BootstrapKey) -> Option<u64> {
        if self.key.borrow().as_ref() == Some(&key) {
            return None;
        }
        *self.key.borrow_mut() = Some(key);
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        Some(generation)
    }

    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }
}

/// Run the full sequence for `config` and return the wrapped client.
///
/// # Errors
///
/// - [`SessionError::MissingClientId`] before anything is loaded.
/// - [`SessionError::RuntimeLoad`] if the runtime cannot be loaded.
/// - [`SessionError::Construct`] if the client constructor fails.
pub async fn bootstrap<L, F, S>(
    config: &SessionConfig,
    runtime: &LoadOnce<L>,
    factory: &F,
    stash: &Stash<S>,
) -> Result<WrappedClient<F::Client>, SessionError>
where
    L: RuntimeLoader,
    F: ClientFactory,
    S: StorageBackend,
{
    let client_id = config.require_client_id()?;
    tracing::info!(url = %config.provider_url(), realm = %config.realm, client_id, "bootstrapping session");

    runtime.ensure(&config.runtime_script_url()).await?;

    let stashed = stash.pop_tokens();
    if stashed.is_some() {
        tracing::debug!("resuming with stashed tokens");
    }
    let options = config.client_options(stashed.as_ref())?;
    let client = factory.construct(&options)?;
    Ok(wrap(client).with_paths(config.paths()))
}
