//! Service layer - gating, tokens, retrieval, and deletion

pub mod approvals;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod maintenance;
pub mod notices;
pub mod retrieval;
pub mod retry;
pub mod scheduler;
pub mod stats;
pub mod tokens;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use approvals::ApprovalService;
pub use config::{GateConfig, MAX_BATCH_SIZE};
pub use context::{ServiceContext, ServiceContextBuilder, SubscriptionLocks};
pub use error::{ServiceError, ServiceResult};
pub use events::{EventOutcome, EventService};
pub use maintenance::SweepReport;
pub use retrieval::{DeliverySummary, RetrievalOutcome, RetrievalPipeline, RetrievalState};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use scheduler::DeletionScheduler;
pub use stats::StatsService;
pub use tokens::TokenService;
pub use verifier::SubscriptionVerifier;
