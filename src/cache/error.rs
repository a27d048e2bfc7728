use super::{DeskId, ReservationId};

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("desk not found: {0}")]
    DeskNotFound(DeskId),

    #[error("reservation not found: {0}")]
    ReservationNotFound(ReservationId),
}
