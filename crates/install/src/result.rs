use pkgjob_resolver::ChangeSet;

/// How a transaction run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Nothing was marked
    NoOp,
    /// Changes were reported, nothing was fetched
    Simulated,
    /// Archives were fetched, nothing was installed
    Downloaded,
    /// Cancelled before installation started
    Cancelled,
    Installed,
}

/// Result of [`crate::TransactionExecutor::execute`]
#[derive(Debug, Clone)]
pub struct TransactionResult {
    pub outcome: TransactionOutcome,
    /// Classified marks, captured before anything was fetched
    pub changes: ChangeSet,
    /// Bytes the plan had to download
    pub fetched_bytes: u64,
}

impl TransactionResult {
    #[must_use]
    pub fn new(outcome: TransactionOutcome, changes: ChangeSet) -> Self {
        Self {
            outcome,
            changes,
            fetched_bytes: 0,
        }
    }

    #[must_use]
    pub fn with_fetched_bytes(mut self, bytes: u64) -> Self {
        self.fetched_bytes = bytes;
        self
    }

    /// Whether the system was modified
    #[must_use]
    pub fn touched_system(&self) -> bool {
        self.outcome == TransactionOutcome::Installed
    }
}
