use async_trait::async_trait;

use crate::errors::EngramResult;
use crate::models::GraphFragment;

/// Synthesizes a short answer from a query and its retrieved fragments.
#[async_trait]
pub trait ISummarizer: Send + Sync {
    async fn summarize(&self, query: &str, fragments: &[GraphFragment]) -> EngramResult<String>;
}
