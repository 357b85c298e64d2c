//! Command error taxonomy
//!
//! Every lifecycle command resolves to either an entity or one of these
//! errors. Errors stay local to the issuing view; other roles only ever
//! observe resulting state changes through their own subscriptions.

use thiserror::Error;

pub type CommandResult<T> = Result<T, CommandError>;

/// Role-facing command failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Place-order with no items, rejected before any store write
    #[error("Cart is empty")]
    EmptyCart,

    /// Malformed line item (non-positive price, zero quantity, ...)
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// A required field for this request type is missing
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Target status is not the immediate successor of the current one
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Another staff member accepted the request first
    #[error("Request already assigned: {0}")]
    AlreadyAssigned(String),

    /// The entity changed between read and write; treat as already handled
    #[error("Concurrent update lost: {0}")]
    ConditionFailed(String),

    /// Store unreachable or failing; subscriptions resume with a full
    /// snapshot once connectivity returns
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl CommandError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CommandError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        CommandError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Input was rejected before reaching the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CommandError::EmptyCart
                | CommandError::InvalidItem(_)
                | CommandError::MissingField(_)
        )
    }

    /// Lost a write race; the view re-syncs from its subscription.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CommandError::AlreadyAssigned(_) | CommandError::ConditionFailed(_)
        )
    }
}
