//! Re-entrancy guard for relation cascades.

/// One of the four reactions of the sync engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handler {
    SetCreated,
    SetDeleted,
    ComponentCreated,
    ComponentDeleted,
}

impl Handler {
    fn bit(self) -> u8 {
        match self {
            Handler::SetCreated => 1,
            Handler::SetDeleted => 1 << 1,
            Handler::ComponentCreated => 1 << 2,
            Handler::ComponentDeleted => 1 << 3,
        }
    }
}

/// Context threaded through every relation write.
///
/// A cascade passes a copy of its context with the handler it must not
/// re-enter marked as suppressed. The context is a plain value owned by the
/// call that received it, so suppression ends when that call returns, on
/// both the success and the error path, and never leaks into concurrent
/// requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CascadeContext {
    suppressed: u8,
    depth: u8,
}

impl CascadeContext {
    /// Context of a write made directly by a user.
    pub fn root() -> Self {
        Self::default()
    }

    /// Derive the context for writes made by `handler`'s cascade, with
    /// `blocked` suppressed on top of whatever is already suppressed.
    pub fn cascade(self, blocked: Handler) -> Self {
        Self {
            suppressed: self.suppressed | blocked.bit(),
            depth: self.depth.saturating_add(1),
        }
    }

    pub fn is_suppressed(&self, handler: Handler) -> bool {
        self.suppressed & handler.bit() != 0
    }

    /// True for writes made by the sync engine rather than by a user.
    pub fn is_cascade(&self) -> bool {
        self.depth > 0
    }

    /// Number of cascades between the user's write and this one.
    pub fn depth(&self) -> u8 {
        self.depth
    }
}
