//! Error types for the tree crate.

use thiserror::Error;

use crate::identity::Token;

/// Errors raised by [`TreeBuilder`](crate::builder::TreeBuilder) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[must_use = "errors must not be silently ignored"]
pub enum BuildError {
    /// The snapshot was requested before the builder was finalized.
    #[error("the overview must be in ready status to be accessed")]
    NotReady,

    /// A notification referenced a token the builder never issued, or one
    /// whose node was already discarded.
    #[error("unknown instance token {0}")]
    UnknownToken(Token),

    /// The builder issued every available token.
    #[error("instance token space exhausted")]
    TokensExhausted,

    /// A mutating notification arrived after the snapshot was published.
    #[error("`{operation}` rejected: the overview is already finalized")]
    AlreadyFinalized { operation: &'static str },
}
