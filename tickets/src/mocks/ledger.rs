//! Mock ledger client for testing.

use crate::error::LedgerError;
use crate::providers::{LedgerClient, TransferConfirmation};
use crate::types::{AccountHandle, Address, Identity, IssuanceStage, Lamports, TokenClassHandle};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// A call the mock received, with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    /// `submit_transfer`
    Transfer {
        /// Payer
        from: Identity,
        /// Destination
        to: Address,
        /// Amount
        amount: Lamports,
    },
    /// `create_token_class`
    CreateTokenClass {
        /// Fee payer
        payer: Identity,
        /// Issuing authority
        authority: Identity,
        /// Decimals requested
        decimals: u8,
    },
    /// `ensure_holding_account`
    EnsureHoldingAccount {
        /// Fee payer
        payer: Identity,
        /// Token class
        token_class: TokenClassHandle,
        /// Account owner
        owner: Identity,
    },
    /// `issue_units`
    IssueUnits {
        /// Fee payer
        payer: Identity,
        /// Token class
        token_class: TokenClassHandle,
        /// Receiving account
        account: AccountHandle,
        /// Issuing authority
        authority: Identity,
        /// Units issued
        amount: u64,
    },
}

impl LedgerCall {
    /// Issuance stage this call belongs to, `None` for transfers.
    #[must_use]
    pub const fn stage(&self) -> Option<IssuanceStage> {
        match self {
            Self::Transfer { .. } => None,
            Self::CreateTokenClass { .. } => Some(IssuanceStage::CreateTokenClass),
            Self::EnsureHoldingAccount { .. } => Some(IssuanceStage::EnsureHoldingAccount),
            Self::IssueUnits { .. } => Some(IssuanceStage::IssueUnit),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<LedgerCall>,
    token_classes: VecDeque<TokenClassHandle>,
    created: u32,
    fail_transfer: Option<LedgerError>,
    fail_stage: Option<(IssuanceStage, LedgerError)>,
}

/// Mock ledger client.
///
/// Succeeds by default and records every call. Token classes are handed out
/// from a configured queue, then as `MINT1`, `MINT2`, ...
#[derive(Debug, Clone, Default)]
pub struct MockLedgerClient {
    inner: Arc<Mutex<Inner>>,
}

impl MockLedgerClient {
    /// Create a new mock ledger client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out these token class handles first, in order.
    #[must_use]
    pub fn with_token_classes<I, T>(self, handles: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.lock()
            .token_classes
            .extend(handles.into_iter().map(TokenClassHandle::new));
        self
    }

    /// Fail every transfer with `error`.
    #[must_use]
    pub fn failing_transfer(self, error: LedgerError) -> Self {
        self.lock().fail_transfer = Some(error);
        self
    }

    /// Fail the given issuance primitive with `error`.
    #[must_use]
    pub fn failing_at(self, stage: IssuanceStage, error: LedgerError) -> Self {
        self.lock().fail_stage = Some((stage, error));
        self
    }

    /// Every call received so far (for testing).
    #[must_use]
    pub fn calls(&self) -> Vec<LedgerCall> {
        self.lock().calls.clone()
    }

    /// Issuance stages invoked so far, in order (for testing).
    #[must_use]
    pub fn stages(&self) -> Vec<IssuanceStage> {
        self.lock().calls.iter().filter_map(LedgerCall::stage).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: LedgerCall) -> Result<(), LedgerError> {
        let mut inner = self.lock();
        let failure = match (call.stage(), &inner.fail_transfer, &inner.fail_stage) {
            (None, Some(error), _) => Some(error.clone()),
            (Some(stage), _, Some((failing, error))) if stage == *failing => Some(error.clone()),
            _ => None,
        };
        inner.calls.push(call);
        failure.map_or(Ok(()), Err)
    }
}

impl LedgerClient for MockLedgerClient {
    async fn submit_transfer(
        &self,
        from: &Identity,
        to: &Address,
        amount: Lamports,
    ) -> Result<TransferConfirmation, LedgerError> {
        self.record(LedgerCall::Transfer {
            from: from.clone(),
            to: to.clone(),
            amount,
        })?;
        Ok(TransferConfirmation {
            signature: format!("SIG{}", self.lock().calls.len()),
            amount,
        })
    }

    async fn create_token_class(
        &self,
        payer: &Identity,
        authority: &Identity,
        decimals: u8,
    ) -> Result<TokenClassHandle, LedgerError> {
        self.record(LedgerCall::CreateTokenClass {
            payer: payer.clone(),
            authority: authority.clone(),
            decimals,
        })?;
        let mut inner = self.lock();
        inner.created += 1;
        let next = inner.created;
        Ok(inner
            .token_classes
            .pop_front()
            .unwrap_or_else(|| TokenClassHandle::new(format!("MINT{next}"))))
    }

    async fn ensure_holding_account(
        &self,
        payer: &Identity,
        token_class: &TokenClassHandle,
        owner: &Identity,
    ) -> Result<AccountHandle, LedgerError> {
        self.record(LedgerCall::EnsureHoldingAccount {
            payer: payer.clone(),
            token_class: token_class.clone(),
            owner: owner.clone(),
        })?;
        Ok(AccountHandle::new(format!("ATA-{token_class}-{owner}")))
    }

    async fn issue_units(
        &self,
        payer: &Identity,
        token_class: &TokenClassHandle,
        account: &AccountHandle,
        authority: &Identity,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.record(LedgerCall::IssueUnits {
            payer: payer.clone(),
            token_class: token_class.clone(),
            account: account.clone(),
            authority: authority.clone(),
            amount,
        })
    }
}
