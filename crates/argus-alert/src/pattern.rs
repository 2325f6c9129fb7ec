//! Pattern-learning extension point.
//!
//! The pipeline offers recent alert history to a [`PatternLearner`] after
//! each tick. The default implementation does nothing; a real model can be
//! substituted without touching the pipeline.

use anyhow::Result;
use argus_common::types::Alert;
use async_trait::async_trait;

#[async_trait]
pub trait PatternLearner: Send + Sync {
    async fn observe(&self, recent: &[Alert]) -> Result<()>;
}

pub struct NoopPatternLearner;

#[async_trait]
impl PatternLearner for NoopPatternLearner {
    async fn observe(&self, recent: &[Alert]) -> Result<()> {
        tracing::debug!(count = recent.len(), "Pattern learning pass (no-op)");
        Ok(())
    }
}
