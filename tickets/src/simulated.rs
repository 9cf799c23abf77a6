//! In-memory ledger.
//!
//! Behaves like a devnet cluster for the purchase workflow: lamport balances
//! funded by airdrops, zero-decimal token classes with a single authority,
//! and holding accounts keyed by (token class, owner). Used by the demo
//! binary and integration tests.

use crate::error::LedgerError;
use crate::providers::{LedgerClient, TransferConfirmation};
use crate::types::{AccountHandle, Address, Identity, Lamports, TokenClassHandle};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug)]
struct TokenClass {
    authority: Identity,
    decimals: u8,
    supply: u64,
}

#[derive(Debug)]
struct HoldingAccount {
    token_class: TokenClassHandle,
    owner: Identity,
    amount: u64,
}

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<Address, Lamports>,
    token_classes: HashMap<TokenClassHandle, TokenClass>,
    holdings: HashMap<(TokenClassHandle, Identity), AccountHandle>,
    accounts: HashMap<AccountHandle, HoldingAccount>,
}

/// Shared in-memory ledger; clones see the same book.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLedger {
    book: Arc<Mutex<Book>>,
    latency: Option<Duration>,
}

impl SimulatedLedger {
    /// Empty ledger with instant confirmations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait `latency` before every call, like a round trip to a cluster.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Credit `amount` to `address`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] if the book is poisoned.
    pub fn airdrop(&self, address: &Address, amount: Lamports) -> Result<(), LedgerError> {
        let mut book = self.book()?;
        let balance = book.balances.entry(address.clone()).or_default();
        *balance = balance.saturating_add(amount);
        tracing::debug!(address = %address, amount = amount.get(), "Airdrop credited");
        Ok(())
    }

    /// Lamport balance of `address` (zero if never funded).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] if the book is poisoned.
    pub fn balance(&self, address: &Address) -> Result<Lamports, LedgerError> {
        Ok(self.book()?.balances.get(address).copied().unwrap_or_default())
    }

    /// Issued supply of `token_class`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] if the book is poisoned.
    pub fn token_supply(&self, token_class: &TokenClassHandle) -> Result<Option<u64>, LedgerError> {
        Ok(self.book()?.token_classes.get(token_class).map(|c| c.supply))
    }

    /// Units held by `owner` of `token_class` (zero without an account).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] if the book is poisoned.
    pub fn holding(&self, token_class: &TokenClassHandle, owner: &Identity) -> Result<u64, LedgerError> {
        let book = self.book()?;
        Ok(book
            .holdings
            .get(&(token_class.clone(), owner.clone()))
            .and_then(|handle| book.accounts.get(handle))
            .map_or(0, |account| account.amount))
    }

    fn book(&self) -> Result<MutexGuard<'_, Book>, LedgerError> {
        self.book.lock().map_err(|_| LedgerError::Unavailable {
            reason: "simulated ledger state poisoned".to_string(),
        })
    }

    async fn round_trip(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn handle(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}

impl LedgerClient for SimulatedLedger {
    async fn submit_transfer(
        &self,
        from: &Identity,
        to: &Address,
        amount: Lamports,
    ) -> Result<TransferConfirmation, LedgerError> {
        self.round_trip().await;

        if amount.get() == 0 {
            return Err(LedgerError::Rejected {
                reason: "transfer amount must be positive".to_string(),
            });
        }

        let mut book = self.book()?;
        let source = from.address();
        let balance = book.balances.get(&source).copied().unwrap_or_default();
        let remaining = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                balance: balance.get(),
                needed: amount.get(),
            })?;

        book.balances.insert(source, remaining);
        let credited = book.balances.entry(to.clone()).or_default();
        *credited = credited.saturating_add(amount);

        let signature = handle("sig");
        tracing::debug!(from = %from, to = %to, amount = amount.get(), %signature, "Transfer confirmed");
        Ok(TransferConfirmation { signature, amount })
    }

    async fn create_token_class(
        &self,
        payer: &Identity,
        authority: &Identity,
        decimals: u8,
    ) -> Result<TokenClassHandle, LedgerError> {
        self.round_trip().await;

        let token_class = TokenClassHandle::new(handle("mint"));
        self.book()?.token_classes.insert(
            token_class.clone(),
            TokenClass {
                authority: authority.clone(),
                decimals,
                supply: 0,
            },
        );
        tracing::debug!(payer = %payer, %token_class, decimals, "Token class created");
        Ok(token_class)
    }

    async fn ensure_holding_account(
        &self,
        payer: &Identity,
        token_class: &TokenClassHandle,
        owner: &Identity,
    ) -> Result<AccountHandle, LedgerError> {
        self.round_trip().await;

        let mut book = self.book()?;
        if !book.token_classes.contains_key(token_class) {
            return Err(LedgerError::Rejected {
                reason: format!("unknown token class {token_class}"),
            });
        }

        let key = (token_class.clone(), owner.clone());
        if let Some(existing) = book.holdings.get(&key) {
            return Ok(existing.clone());
        }

        let account = AccountHandle::new(handle("acct"));
        book.accounts.insert(
            account.clone(),
            HoldingAccount {
                token_class: token_class.clone(),
                owner: owner.clone(),
                amount: 0,
            },
        );
        book.holdings.insert(key, account.clone());
        tracing::debug!(payer = %payer, %token_class, owner = %owner, %account, "Holding account created");
        Ok(account)
    }

    async fn issue_units(
        &self,
        payer: &Identity,
        token_class: &TokenClassHandle,
        account: &AccountHandle,
        authority: &Identity,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.round_trip().await;

        let mut book = self.book()?;
        let Book {
            token_classes,
            accounts,
            ..
        } = &mut *book;

        let class = token_classes
            .get_mut(token_class)
            .ok_or_else(|| LedgerError::Rejected {
                reason: format!("unknown token class {token_class}"),
            })?;
        if &class.authority != authority {
            return Err(LedgerError::AccountMismatch {
                reason: format!("{authority} is not the issuing authority of {token_class}"),
            });
        }

        let holding = accounts.get_mut(account).ok_or_else(|| LedgerError::Rejected {
            reason: format!("unknown account {account}"),
        })?;
        if &holding.token_class != token_class {
            return Err(LedgerError::AccountMismatch {
                reason: format!("{account} holds {} not {token_class}", holding.token_class),
            });
        }

        class.supply = class.supply.saturating_add(amount);
        holding.amount = holding.amount.saturating_add(amount);
        tracing::debug!(
            payer = %payer,
            %token_class,
            %account,
            owner = %holding.owner,
            decimals = class.decimals,
            amount,
            "Units issued"
        );
        Ok(())
    }
}
