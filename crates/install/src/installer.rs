//! Handing the plan to the system package installer

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use pkgjob_errors::{Error, TransactionError};
use pkgjob_events::{EventEmitter, EventSender, PhaseProgress, Status};
use pkgjob_platform::CancelToken;
use pkgjob_resolver::{DepCache, InstallStep, StepAction};
use pkgjob_store::archive_file_name;
use tokio::process::Command;

/// One step as the installer sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallItem {
    pub name: String,
    pub package_id: String,
    pub action: StepAction,
    /// Archive to unpack, set for installs only
    pub archive: Option<PathBuf>,
}

impl InstallItem {
    /// Resolve planned steps to names and archive paths
    #[must_use]
    pub fn from_steps(cache: &DepCache, steps: &[InstallStep], archive_dir: &Path) -> Vec<Self> {
        let store = cache.store();
        steps
            .iter()
            .map(|step| {
                let ver = store.version(step.version);
                let name = store.owner(step.version).name.clone();
                let archive = (step.action == StepAction::Install)
                    .then(|| archive_dir.join(archive_file_name(&name, ver)));
                Self {
                    package_id: store.build_identifier(step.version).to_string(),
                    name,
                    action: step.action,
                    archive,
                }
            })
            .collect()
    }
}

/// Progress handle passed to the installer
///
/// Overall progress is steps done over steps total. A registered child pid
/// is what a cancel request would signal, had cancellation still been
/// allowed.
#[derive(Debug)]
pub struct InstallProgress {
    progress: PhaseProgress,
    cancel: CancelToken,
    total: usize,
    done: usize,
}

impl InstallProgress {
    #[must_use]
    pub fn new(sender: Option<EventSender>, cancel: CancelToken, total: usize) -> Self {
        Self {
            progress: PhaseProgress::new(sender),
            cancel,
            total,
            done: 0,
        }
    }

    pub fn start(&mut self) {
        self.progress.set_status(Status::Install);
        self.progress.emit_debug("Installing updates");
    }

    pub fn item_started(&mut self, item: &InstallItem) {
        let status = match item.action {
            StepAction::Install => Status::Install,
            StepAction::Remove => Status::Remove,
        };
        self.progress.emit_item_progress(&item.package_id, status, 0);
    }

    pub fn item_finished(&mut self, item: &InstallItem) {
        self.done += 1;
        self.progress
            .emit_item_progress(&item.package_id, Status::Finished, 100);
        self.progress.set_ratio(self.done, self.total);
    }

    pub fn set_child_pid(&self, pid: Option<i32>) {
        self.cancel.set_child_pid(pid);
    }
}

#[async_trait]
pub trait SystemInstaller: Send + Sync {
    /// Apply `items` in order
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::InstallFailed` when a step fails.
    async fn install(&self, items: &[InstallItem], progress: &mut InstallProgress) -> Result<(), Error>;
}

/// Runs `dpkg` once per step
#[derive(Debug, Clone)]
pub struct DpkgInstaller {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl Default for DpkgInstaller {
    fn default() -> Self {
        Self::new("dpkg")
    }
}

impl DpkgInstaller {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Arguments passed before the action, e.g. `--force-confdef`
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    fn command_for(&self, item: &InstallItem) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        match (&item.action, &item.archive) {
            (StepAction::Install, Some(archive)) => cmd.arg("--install").arg(archive),
            _ => cmd.arg("--remove").arg(&item.name),
        };
        cmd
    }
}

#[async_trait]
impl SystemInstaller for DpkgInstaller {
    async fn install(&self, items: &[InstallItem], progress: &mut InstallProgress) -> Result<(), Error> {
        progress.start();

        for item in items {
            progress.item_started(item);
            let child = self.command_for(item).spawn().map_err(|e| failed(item, &e.to_string()))?;
            progress.set_child_pid(child.id().and_then(|id| i32::try_from(id).ok()));

            let output = child.wait_with_output().await;
            progress.set_child_pid(None);
            let output = output.map_err(|e| failed(item, &e.to_string()))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(failed(item, stderr.trim()));
            }
            progress.item_finished(item);
        }
        Ok(())
    }
}

fn failed(item: &InstallItem, reason: &str) -> Error {
    tracing::warn!(package = %item.name, reason, "installer step failed");
    TransactionError::InstallFailed {
        message: format!("{}: {reason}", item.name),
    }
    .into()
}
