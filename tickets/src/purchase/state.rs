//! Purchase store state.

use crate::catalog::Catalog;
use crate::types::{OfferingId, PurchaseRequest, RequestId, TicketOffering};
use std::collections::HashMap;

/// Catalog plus every purchase attempt still in flight.
///
/// The store owns the only mutable copy of the catalog; issuance is recorded
/// here and nowhere else.
#[derive(Debug, Clone, Default)]
pub struct PurchaseState {
    pub(crate) catalog: Catalog,
    pub(crate) requests: HashMap<RequestId, PurchaseRequest>,
}

impl PurchaseState {
    /// State over `catalog` with no attempts open.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            requests: HashMap::new(),
        }
    }

    /// The catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Offering by id.
    #[must_use]
    pub fn offering(&self, id: OfferingId) -> Option<&TicketOffering> {
        self.catalog.get(id)
    }

    /// In-flight attempt by id.
    #[must_use]
    pub fn request(&self, id: RequestId) -> Option<&PurchaseRequest> {
        self.requests.get(&id)
    }

    /// Number of attempts in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.requests.len()
    }
}
