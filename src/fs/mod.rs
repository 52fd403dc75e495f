pub mod local;
pub mod store;
pub mod types;

pub use local::{LocalFs, LocalStore};
pub use store::{join_remote, remote_rel, RemoteStore, ScopedSession, Session};
pub use types::*;
