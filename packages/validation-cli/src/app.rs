//! Builds the in-memory orchestrator instance the CLI drives. Every
//! invocation starts from a blank store, the same mock-tolerant,
//! offline-first posture the core library targets.

use std::sync::Arc;

use validation_core::store::{MemoryJobStore, MemoryReportStore, MemoryResultLog};
use validation_core::{
    idempotency::InMemoryIdempotencyStore, rate_limit::InMemoryRateLimitStore, Orchestrator, OrchestratorConfig,
};

pub type DemoOrchestrator =
    Orchestrator<MemoryJobStore, MemoryResultLog, MemoryReportStore, InMemoryIdempotencyStore, InMemoryRateLimitStore>;

pub fn build_orchestrator() -> Arc<DemoOrchestrator> {
    Arc::new(Orchestrator::new(
        OrchestratorConfig::default(),
        crate::connectors_demo::build(),
        MemoryJobStore::default(),
        MemoryResultLog::default(),
        MemoryReportStore::default(),
        InMemoryIdempotencyStore::default(),
        InMemoryRateLimitStore::default(),
    ))
}
