//! Role-based row visibility.

use crate::domain::{Caller, UserId};

/// Which assignments a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every assignment
    All,
    /// Only assignments owned by this user
    OwnedBy(UserId),
    /// Restricted caller without an identity sees nothing
    Nothing,
}

impl Visibility {
    /// Visibility for a caller: privileged sees all, restricted sees own.
    pub fn for_caller(caller: &Caller) -> Self {
        if caller.is_privileged() {
            return Visibility::All;
        }
        match caller.id {
            Some(id) => Visibility::OwnedBy(id),
            None => Visibility::Nothing,
        }
    }

    /// Check a row owned by `owner`.
    pub fn allows_owner(&self, owner: Option<UserId>) -> bool {
        match self {
            Visibility::All => true,
            Visibility::OwnedBy(id) => owner == Some(*id),
            Visibility::Nothing => false,
        }
    }
}
