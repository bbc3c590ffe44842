pub mod error;
pub mod hash;
pub mod inputs;
pub mod net;
pub mod pattern;
pub mod permission;
pub mod state;
pub mod uri;

pub use error::ConversionError;
pub use inputs::{registry, Input, ShortUriMethod};
pub use net::{NetworkAccess, NetworkError, ReqwestNetwork, Retry, MAX_RETRY_COUNT};
pub use permission::{MemoryPermissionStore, Permission, PermissionStore};
pub use state::{ConversionState, Converter, NoopObserver, StateObserver, MAX_TRANSITIONS};
pub use uri::Uri;
