//! Temp-file workspace service
//!
//! Some primary-extractor implementations need scratch files on disk. The
//! workspace is a process-scoped service with explicit startup and shutdown:
//! startup sweeps leftovers from crashed runs, every extraction acquires an
//! owner-only lease directory, and dropping the lease removes it.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use ce_domain::{Error, Result};

const WORKSPACE_DIR_NAME: &str = "context-engine-workspace";

/// Process-scoped scratch directory manager
#[derive(Debug)]
pub struct TempWorkspace {
    root: PathBuf,
}

/// One leased scratch directory; removed on drop
#[derive(Debug)]
pub struct WorkspaceLease {
    path: PathBuf,
}

impl WorkspaceLease {
    /// Path of the leased directory
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkspaceLease {
    fn drop(&mut self) {
        if let Err(error) = std::fs::remove_dir_all(&self.path) {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), %error, "failed to drop workspace lease");
            }
        }
    }
}

impl TempWorkspace {
    /// Start the workspace: create the root with owner-only permissions and
    /// sweep leftovers when `initial_cleanup` is set.
    pub fn startup(root: Option<PathBuf>, initial_cleanup: bool) -> Result<Self> {
        let root = root.unwrap_or_else(std::env::temp_dir).join(WORKSPACE_DIR_NAME);

        if initial_cleanup {
            match std::fs::remove_dir_all(&root) {
                Ok(()) => {}
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => {
                    return Err(Error::storage_with_source("workspace sweep failed", error));
                }
            }
        }
        std::fs::create_dir_all(&root)
            .map_err(|e| Error::storage_with_source("workspace creation failed", e))?;
        set_owner_only(&root)?;

        Ok(Self { root })
    }

    /// Acquire a scratch directory for one extraction
    pub fn lease(&self) -> Result<WorkspaceLease> {
        let path = self.root.join(Uuid::new_v4().simple().to_string());
        std::fs::create_dir(&path)
            .map_err(|e| Error::storage_with_source("workspace lease failed", e))?;
        set_owner_only(&path)?;
        Ok(WorkspaceLease { path })
    }

    /// Workspace root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drain the workspace on shutdown
    pub fn shutdown(&self) {
        if let Err(error) = std::fs::remove_dir_all(&self.root) {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(%error, "workspace shutdown sweep failed");
            }
        }
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let permissions = std::fs::Permissions::from_mode(0o700);
    std::fs::set_permissions(path, permissions)
        .map_err(|e| Error::storage_with_source("workspace permissions failed", e))
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_sweeps_leftovers() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().to_path_buf();

        let workspace = TempWorkspace::startup(Some(root.clone()), true).unwrap();
        let leftover = workspace.root().join("stale");
        std::fs::create_dir(&leftover).unwrap();

        let workspace = TempWorkspace::startup(Some(root), true).unwrap();
        assert!(!leftover.exists());
        assert!(workspace.root().exists());
    }

    #[test]
    fn lease_is_removed_on_drop() {
        let base = tempfile::tempdir().unwrap();
        let workspace =
            TempWorkspace::startup(Some(base.path().to_path_buf()), true).unwrap();

        let lease_path = {
            let lease = workspace.lease().unwrap();
            assert!(lease.path().exists());
            lease.path().to_path_buf()
        };
        assert!(!lease_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn workspace_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let base = tempfile::tempdir().unwrap();
        let workspace =
            TempWorkspace::startup(Some(base.path().to_path_buf()), true).unwrap();
        let mode = std::fs::metadata(workspace.root()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
