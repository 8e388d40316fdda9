//! Per-build instance tokens.

use std::{
    fmt::{self, Display, Formatter},
    sync::atomic::{AtomicU32, Ordering},
};

/// Opaque identifier of one plugin instance during a build.
///
/// Tokens correlate notifications with the node they target. They are only
/// unique within the [`TokenAllocator`] that issued them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Token(u32);

impl Token {
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic token source scoped to a single build.
///
/// Tokens start at 1; zero is never issued.
#[derive(Debug)]
pub struct TokenAllocator {
    next: AtomicU32,
}

impl Default for TokenAllocator {
    fn default() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }
}

impl TokenAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn starting_at(value: u32) -> Self {
        Self {
            next: AtomicU32::new(value),
        }
    }

    /// Returns a token never issued before by this allocator, or `None` once
    /// the `u32` space is used up.
    #[must_use]
    pub fn allocate(&self) -> Option<Token> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| next.checked_add(1))
            .ok()
            .map(Token)
    }
}
