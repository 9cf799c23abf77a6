//! Ledger client provider.
//!
//! Value transfer and the three issuance primitives a ticket needs: a token
//! class with zero decimals, a holding account for the buyer, and one unit
//! issued into it.

use crate::error::LedgerError;
use crate::types::{AccountHandle, Address, Identity, Lamports, TokenClassHandle};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A confirmed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfirmation {
    /// Transaction signature
    pub signature: String,
    /// Amount moved
    pub amount: Lamports,
}

/// Ledger operations used by the purchase workflow.
///
/// Implementations are cloned into effects, so they should be cheap handles
/// over shared state.
pub trait LedgerClient: Clone + Send + Sync + 'static {
    /// Transfer `amount` from `from` to `to` and wait for confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the transfer is rejected or not confirmed.
    fn submit_transfer(
        &self,
        from: &Identity,
        to: &Address,
        amount: Lamports,
    ) -> impl Future<Output = Result<TransferConfirmation, LedgerError>> + Send;

    /// Create a new token class whose issuing authority is `authority`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the ledger refuses the creation.
    fn create_token_class(
        &self,
        payer: &Identity,
        authority: &Identity,
        decimals: u8,
    ) -> impl Future<Output = Result<TokenClassHandle, LedgerError>> + Send;

    /// Create, or return the existing, holding account of `owner` for
    /// `token_class`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the token class is unknown or the ledger
    /// refuses.
    fn ensure_holding_account(
        &self,
        payer: &Identity,
        token_class: &TokenClassHandle,
        owner: &Identity,
    ) -> impl Future<Output = Result<AccountHandle, LedgerError>> + Send;

    /// Issue `amount` units of `token_class` into `account`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AccountMismatch`] if `authority` or `account`
    /// do not belong to `token_class`.
    fn issue_units(
        &self,
        payer: &Identity,
        token_class: &TokenClassHandle,
        account: &AccountHandle,
        authority: &Identity,
        amount: u64,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;
}
