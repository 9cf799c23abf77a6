//! Wallet (signer) provider.

use crate::types::Identity;
use std::sync::{Arc, PoisonError, RwLock};

/// Source of the currently connected signer.
///
/// Queried when an attempt opens and again right before paying.
pub trait Wallet: Send + Sync {
    /// The connected identity, or `None` when no wallet is connected.
    fn current_identity(&self) -> Option<Identity>;
}

/// Wallet whose connection is toggled by the embedding application.
///
/// Clones share the same connection.
#[derive(Debug, Clone, Default)]
pub struct SessionWallet {
    identity: Arc<RwLock<Option<Identity>>>,
}

impl SessionWallet {
    /// Disconnected wallet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wallet already connected as `identity`.
    #[must_use]
    pub fn connected(identity: Identity) -> Self {
        let wallet = Self::new();
        wallet.connect(identity);
        wallet
    }

    /// Connect (or switch to) `identity`.
    pub fn connect(&self, identity: Identity) {
        tracing::info!(identity = %identity, "Wallet connected");
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = Some(identity);
    }

    /// Drop the connection.
    pub fn disconnect(&self) {
        tracing::info!("Wallet disconnected");
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Wallet for SessionWallet {
    fn current_identity(&self) -> Option<Identity> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
