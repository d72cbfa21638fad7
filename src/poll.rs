//! Polling primitives behind `use_tock` and `use_token`.
//!
//! DESIGN
//! ======
//! The identity client exposes no change notification for every token
//! mutation, so hooks re-read it on a timer. [`TokenWatch`] decides whether
//! a read is new enough to publish; [`TimerSlot`] guarantees one live timer
//! per subscription, tearing the old one down before a replacement starts.

#[cfg(test)]
#[path = "poll_test.rs"]
mod poll_test;

use std::time::Duration;

use crate::client::{Claims, IdentityClient, TokenKind, WrappedClient};

/// How often a hook re-reads its source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    /// No timer; the last published value stays.
    Disabled,
    Every(Duration),
}

impl Period {
    /// Whole seconds; `0` disables.
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 { Self::Disabled } else { Self::Every(Duration::from_secs(secs)) }
    }

    #[must_use]
    pub fn for_kind(kind: TokenKind) -> Self {
        Self::Every(kind.default_period())
    }

    #[must_use]
    pub fn duration(self) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::Every(d) if d.is_zero() => None,
            Self::Every(d) => Some(d),
        }
    }

    /// Milliseconds for a browser interval, saturating at `u32::MAX`.
    #[must_use]
    pub fn millis(self) -> Option<u32> {
        self.duration().map(|d| u32::try_from(d.as_millis()).unwrap_or(u32::MAX))
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::from_secs(1)
    }
}

impl From<u64> for Period {
    fn from(secs: u64) -> Self {
        Self::from_secs(secs)
    }
}

impl From<Option<u64>> for Period {
    fn from(secs: Option<u64>) -> Self {
        secs.map_or(Self::Disabled, Self::from_secs)
    }
}

/// One token and its decoded claims, as last seen on the client.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenState {
    pub token: Option<String>,
    pub claims: Option<Claims>,
}

impl TokenState {
    pub fn read<C: IdentityClient>(client: &WrappedClient<C>, kind: TokenKind) -> Self {
        Self { token: client.token(kind), claims: client.claims(kind) }
    }
}

/// Change detector for one token kind.
#[derive(Clone, Debug)]
pub struct TokenWatch {
    kind: TokenKind,
    last: Option<TokenState>,
}

impl TokenWatch {
    #[must_use]
    pub fn new(kind: TokenKind) -> Self {
        Self { kind, last: None }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn last(&self) -> Option<&TokenState> {
        self.last.as_ref()
    }

    /// Read the client and return the state if it differs from the last
    /// published one. The first check always publishes.
    pub fn check<C: IdentityClient>(&mut self, client: &WrappedClient<C>) -> Option<TokenState> {
        let current = TokenState::read(client, self.kind);
        if self.last.as_ref() == Some(&current) {
            return None;
        }
        self.last = Some(current.clone());
        Some(current)
    }

    /// Forget the last value, so the next check publishes unconditionally.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Holds at most one live timer handle. Dropping a handle cancels its timer.
#[derive(Debug)]
pub struct TimerSlot<H> {
    current: Option<H>,
}

impl<H> TimerSlot<H> {
    #[must_use]
    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Tear down the current timer, then start a new one with `start`.
    pub fn replace(&mut self, start: impl FnOnce() -> H) {
        self.clear();
        self.current = Some(start());
    }

    pub fn clear(&mut self) {
        drop(self.current.take());
    }
}

impl<H> Default for TimerSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}
