use async_trait::async_trait;

use crate::{change::ChangeContext, result::Result};

/// A single mutation of a checked out repository. Implementations edit the
/// working tree only; staging and committing happen elsewhere.
#[async_trait]
pub trait ApplyChange {
    async fn apply(&self, ctx: &ChangeContext<'_>) -> Result<()>;
}
