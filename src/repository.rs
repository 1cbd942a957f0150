use crate::error::StoreError;
use crate::model::{Blink, NewBlink};

/// Storage seam for blinks. The handlers only ever see this trait, so the
/// libsql database and test doubles are interchangeable.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BlinkRepository: Send + Sync {
    /// Point lookup on the unique key.
    async fn find_unique(&self, unique_blink_id: &str) -> Result<Option<Blink>, StoreError>;

    /// Inserts the blink and returns the row as stored. A uniqueness
    /// violation surfaces here as an ordinary `StoreError`.
    async fn create(&self, new: NewBlink) -> Result<Blink, StoreError>;
}
