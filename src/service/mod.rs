//! Service layer
//!
//! Contains business logic separated from the batch entry point.
//! Services orchestrate database operations.

mod account;
mod cleanup;
mod notification;

pub use account::AccountService;
pub use cleanup::{
    CandidateOutcome, CandidateState, CleanupReport, CleanupService, CleanupStep, CleanupStore,
    StepFailure,
};
pub use notification::NotificationService;
