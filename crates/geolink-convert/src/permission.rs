//! Tri-state connection permission and the store collaborator.

use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Persisted user preference for network access during conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Always,
    Ask,
    Never,
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Permission::Always),
            "ask" => Ok(Permission::Ask),
            "never" => Ok(Permission::Never),
            other => Err(format!("expected always|ask|never, got \"{other}\"")),
        }
    }
}

/// Preference store the state machine reads and writes through.
///
/// Implementations must be safe for concurrent use by independent
/// conversions; plain last-write-wins is sufficient since writes are
/// idempotent.
pub trait PermissionStore: Send + Sync {
    fn get_connection_permission(&self) -> Permission;
    fn set_connection_permission(&self, value: Permission);
}

impl<T: PermissionStore + ?Sized> PermissionStore for std::sync::Arc<T> {
    fn get_connection_permission(&self) -> Permission {
        self.as_ref().get_connection_permission()
    }

    fn set_connection_permission(&self, value: Permission) {
        self.as_ref().set_connection_permission(value);
    }
}

/// In-memory store, seeded from configuration.
#[derive(Debug)]
pub struct MemoryPermissionStore {
    value: Mutex<Permission>,
}

impl MemoryPermissionStore {
    #[must_use]
    pub fn new(initial: Permission) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }
}

impl PermissionStore for MemoryPermissionStore {
    fn get_connection_permission(&self) -> Permission {
        *self.value.lock().expect("permission store lock poisoned")
    }

    fn set_connection_permission(&self, value: Permission) {
        *self.value.lock().expect("permission store lock poisoned") = value;
    }
}
