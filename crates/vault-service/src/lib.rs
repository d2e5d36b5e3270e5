//! # vault-service
//!
//! Application layer: subscription gating, token issue and resolution,
//! the retrieval pipeline, and the deletion scheduler.

pub mod dto;
pub mod services;

pub use services::{
    retry_with_backoff, ApprovalService, DeletionScheduler, DeliverySummary, EventOutcome,
    EventService, GateConfig, RetrievalOutcome, RetrievalPipeline, RetrievalState, RetryPolicy,
    ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult, StatsService,
    SubscriptionVerifier, TokenService,
};
