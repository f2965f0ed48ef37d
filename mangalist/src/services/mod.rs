//! Services module
//!
//! The view engine, the mutation dispatcher that writes through to the
//! collection, and settings persistence.

pub mod dispatcher;
pub mod settings;
pub mod view;

pub use dispatcher::{ConfirmationGate, MutationDispatcher};
pub use settings::{AppSettings, Backend, SettingsService};
pub use view::{
    compute_hot, recompute_hot, ReloadOutcome, ReloadTicket, SortColumn, SortOrder, Sorting,
    StatusFilter, ViewEngine, ViewSnapshot,
};
