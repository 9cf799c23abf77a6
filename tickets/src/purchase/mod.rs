//! Purchase workflow: begin, choose a payment method, confirm or cancel.

pub mod actions;
pub mod environment;
pub mod orchestrator;
pub mod reducer;
pub mod state;

pub use actions::PurchaseAction;
pub use environment::{PurchaseEnvironment, PurchaseSettings};
pub use orchestrator::{PurchaseOrchestrator, PurchaseStore};
pub use reducer::PurchaseReducer;
pub use state::PurchaseState;
