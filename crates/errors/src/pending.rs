//! Per-job pending diagnostics
//!
//! Lower layers record errors and warnings here while a cache is open.
//! The owner decides when to drain them into events and when stale
//! entries are discarded (lock retries, cache drop).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    pub kind: PendingKind,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct PendingErrors {
    entries: Vec<PendingMessage>,
}

impl PendingErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.entries.push(PendingMessage {
            kind: PendingKind::Error,
            message: message.into(),
        });
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.entries.push(PendingMessage {
            kind: PendingKind::Warning,
            message: message.into(),
        });
    }

    /// True when at least one entry is an error (warnings don't count).
    #[must_use]
    pub fn has_pending_error(&self) -> bool {
        self.entries.iter().any(|e| e.kind == PendingKind::Error)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return everything recorded so far, oldest first.
    pub fn drain(&mut self) -> Vec<PendingMessage> {
        std::mem::take(&mut self.entries)
    }

    /// Join all pending error messages into one line.
    #[must_use]
    pub fn error_summary(&self) -> String {
        self.entries
            .iter()
            .filter(|e| e.kind == PendingKind::Error)
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn discard(&mut self) {
        self.entries.clear();
    }
}
