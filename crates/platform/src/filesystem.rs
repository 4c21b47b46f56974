//! Free-space probing for the archive directory

use std::path::Path;

use pkgjob_errors::Error;

/// Free-space snapshot of the filesystem holding a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeSpace {
    pub free_blocks: u64,
    pub block_size: u64,
    /// RAM-backed filesystems report no meaningful free space
    pub ram_backed: bool,
}

impl FreeSpace {
    /// Whether `bytes` more can be written. RAM-backed filesystems always pass.
    #[must_use]
    pub fn has_room_for(&self, bytes: u64) -> bool {
        if self.ram_backed {
            return true;
        }
        let needed_blocks = bytes / self.block_size.max(1);
        self.free_blocks >= needed_blocks
    }
}

pub trait SpaceProbe: Send + Sync {
    /// Probe the filesystem that holds `path`
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the filesystem cannot be queried.
    fn probe(&self, path: &Path) -> Result<FreeSpace, Error>;
}

/// Probe backed by `statvfs(2)` and, on Linux, `statfs(2)` for the
/// filesystem magic.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatvfsProbe;

impl SpaceProbe for StatvfsProbe {
    fn probe(&self, path: &Path) -> Result<FreeSpace, Error> {
        let failed = |e: nix::Error| {
            Error::io_message(
                std::io::Error::from(e).kind(),
                format!("Couldn't determine free space in {}", path.display()),
                path,
            )
        };

        let stat = nix::sys::statvfs::statvfs(path).map_err(failed)?;

        Ok(FreeSpace {
            free_blocks: u64::from(stat.blocks_free()),
            block_size: u64::from(stat.block_size()),
            ram_backed: is_ramfs(path).map_err(failed)?,
        })
    }
}

#[cfg(target_os = "linux")]
const RAMFS_MAGIC: nix::sys::statfs::FsType = nix::sys::statfs::FsType(0x8584_58f6);

#[cfg(target_os = "linux")]
fn is_ramfs(path: &Path) -> Result<bool, nix::Error> {
    Ok(nix::sys::statfs::statfs(path)?.filesystem_type() == RAMFS_MAGIC)
}

#[cfg(not(target_os = "linux"))]
fn is_ramfs(_path: &Path) -> Result<bool, nix::Error> {
    Ok(false)
}
