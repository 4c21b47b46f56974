use std::path::PathBuf;

use pkgjob_events::EventSender;

/// Flags for one transaction run
#[derive(Clone, Debug)]
pub struct ExecuteContext {
    /// Report what would change without touching the system
    pub simulate: bool,
    /// Stop once every archive is fetched
    pub download_only: bool,
    /// Where archives are cached; the lock file lives here too
    pub archive_dir: PathBuf,

    /// Event sender for progress reporting
    pub event_sender: Option<EventSender>,
}

context_builder! {
    ExecuteContext {
        simulate: bool,
        download_only: bool,
        archive_dir: PathBuf,
    }
}
