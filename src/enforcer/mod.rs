//! Firewall enforcement (ufw) and the privilege it requires.

mod ufw;

pub use ufw::{rule_exists, Ufw};

use crate::error::BlockError;

#[cfg(test)]
use mockall::automock;

/// Source of the process's effective user id
#[cfg_attr(test, automock)]
pub trait Privileges: Send + Sync {
    fn effective_uid(&self) -> u32;
}

/// The calling process's real credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessPrivileges;

impl Privileges for ProcessPrivileges {
    fn effective_uid(&self) -> u32 {
        // SAFETY: geteuid() is a simple syscall that reads the effective user ID.
        // It has no preconditions, never fails, and doesn't modify any state.
        unsafe { libc::geteuid() }
    }
}

/// Check if running as root (effective UID == 0)
///
/// Firewall changes and package installs both need root; running under
/// sudo is the expected case.
pub fn check_root<P: Privileges + ?Sized>(privileges: &P) -> Result<(), BlockError> {
    if privileges.effective_uid() != 0 {
        return Err(BlockError::Permission);
    }
    Ok(())
}
