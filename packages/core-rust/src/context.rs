//! Request-scoped correlation context.
//!
//! A [`Context`] carries the flat correlation identifiers (trace, request,
//! user, session) of one logical operation along its call chain. The four
//! slots sit behind an `Arc` and are copied on write: every binding allocates
//! a fresh slot array, so a handle received from a caller is never changed by
//! the callee, and clones are a single `Arc` increment.
//!
//! Every accessor is total. An absent handle (`None`) behaves exactly like an
//! empty [`Context`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// One of the four correlation identifiers a [`Context`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CorrelationKey {
    /// Identifier shared by every operation in one distributed flow.
    TraceId,
    /// Identifier generated fresh for each inbound call.
    RequestId,
    /// Authenticated user, when identity is resolvable.
    UserId,
    /// Client session, when one exists.
    SessionId,
}

impl CorrelationKey {
    /// All keys, in the order they are reported.
    pub const ALL: [CorrelationKey; 4] = [
        CorrelationKey::TraceId,
        CorrelationKey::RequestId,
        CorrelationKey::UserId,
        CorrelationKey::SessionId,
    ];

    /// Position of this key in [`CorrelationKey::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            CorrelationKey::TraceId => 0,
            CorrelationKey::RequestId => 1,
            CorrelationKey::UserId => 2,
            CorrelationKey::SessionId => 3,
        }
    }

    /// Field name used for this key in log records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CorrelationKey::TraceId => "trace_id",
            CorrelationKey::RequestId => "request_id",
            CorrelationKey::UserId => "user_id",
            CorrelationKey::SessionId => "session_id",
        }
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known correlation key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown correlation key: {0}")]
pub struct UnknownKeyError(pub String);

impl FromStr for CorrelationKey {
    type Err = UnknownKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CorrelationKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownKeyError(s.to_string()))
    }
}

/// One slot per [`CorrelationKey`], indexed by [`CorrelationKey::index`].
type Slots = [Option<Arc<str>>; 4];

/// Immutable carrier of correlation identifiers for one logical operation.
///
/// `Context::default()` is the empty base a boundary starts from.
#[derive(Debug, Clone, Default)]
pub struct Context {
    slots: Arc<Slots>,
}

impl Context {
    /// Returns an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a derived context with `key` bound to `value`.
    ///
    /// The receiver is left untouched; descendants of the returned handle see
    /// the new value, ancestors keep theirs. Rebinding a key replaces its slot,
    /// so a handle never grows beyond four values.
    #[must_use]
    pub fn with(&self, key: CorrelationKey, value: impl Into<Arc<str>>) -> Context {
        let mut slots: Slots = (*self.slots).clone();
        slots[key.index()] = Some(value.into());
        Context {
            slots: Arc::new(slots),
        }
    }

    /// Returns the value bound to `key`, or `""` when it is unbound or empty.
    #[must_use]
    pub fn get(&self, key: CorrelationKey) -> &str {
        self.slots[key.index()].as_deref().unwrap_or_default()
    }

    /// Returns `true` when no key carries a non-empty value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        CorrelationKey::ALL.iter().all(|key| self.get(*key).is_empty())
    }

    #[must_use]
    pub fn with_trace_id(&self, trace_id: impl Into<Arc<str>>) -> Context {
        self.with(CorrelationKey::TraceId, trace_id)
    }

    #[must_use]
    pub fn with_request_id(&self, request_id: impl Into<Arc<str>>) -> Context {
        self.with(CorrelationKey::RequestId, request_id)
    }

    #[must_use]
    pub fn with_user_id(&self, user_id: impl Into<Arc<str>>) -> Context {
        self.with(CorrelationKey::UserId, user_id)
    }

    #[must_use]
    pub fn with_session_id(&self, session_id: impl Into<Arc<str>>) -> Context {
        self.with(CorrelationKey::SessionId, session_id)
    }

    #[must_use]
    pub fn trace_id(&self) -> &str {
        self.get(CorrelationKey::TraceId)
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        self.get(CorrelationKey::RequestId)
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        self.get(CorrelationKey::UserId)
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        self.get(CorrelationKey::SessionId)
    }

    /// Returns this context with a trace id guaranteed, plus that id.
    ///
    /// An existing non-empty trace id is kept as is; otherwise a new one is
    /// generated and bound on a derived handle.
    #[must_use]
    pub fn ensure_trace_id(&self) -> (Context, String) {
        let existing = self.trace_id();
        if !existing.is_empty() {
            return (self.clone(), existing.to_string());
        }
        let trace_id = generate_trace_id();
        (self.with_trace_id(trace_id.as_str()), trace_id)
    }
}

/// Binds `key` to `value` on a handle derived from `handle`.
///
/// An absent handle is treated as an empty base.
#[must_use]
pub fn bind<'a>(
    handle: impl Into<Option<&'a Context>>,
    key: CorrelationKey,
    value: impl Into<Arc<str>>,
) -> Context {
    match handle.into() {
        Some(ctx) => ctx.with(key, value),
        None => Context::default().with(key, value),
    }
}

/// Reads `key` from `handle`; `""` when the handle is absent or the key unset.
#[must_use]
pub fn read<'a>(handle: impl Into<Option<&'a Context>>, key: CorrelationKey) -> &'a str {
    handle.into().map_or("", |ctx| ctx.get(key))
}

/// Ensures `handle` carries a trace id; see [`Context::ensure_trace_id`].
#[must_use]
pub fn ensure_trace_id<'a>(handle: impl Into<Option<&'a Context>>) -> (Context, String) {
    match handle.into() {
        Some(ctx) => ctx.ensure_trace_id(),
        None => Context::default().ensure_trace_id(),
    }
}

/// Generates a random 128-bit identifier as 32 lowercase hex characters.
#[must_use]
pub fn generate_trace_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
