use thiserror::Error;

use crate::binding_id::BindingId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Nothing in the container hierarchy is bound under this id.
    #[error("no binding found for {0}")]
    Unresolved(BindingId),
    /// The id is already bound to a value that is still valid.
    #[error("{0} is already bound to a live value")]
    BindConflict(BindingId),
    #[error("a future was already retrieved from this promise")]
    FutureAlreadyRetrieved,
    /// The producer side was canceled or dropped before fulfilling.
    #[error("the outcome was canceled before a value arrived")]
    Canceled,
    #[error("invalid value {value:?} for setting {key}")]
    InvalidSetting { key: String, value: String },
}
