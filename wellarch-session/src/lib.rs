//! Persistence for Well-Architected review sessions.
//!
//! A [`Session`] gathers the workload model, evaluations, risks and
//! improvement plan of one review so it can be resumed later.
//! [`SessionStore`] keeps each session as a JSON file under
//! `wellarch_paths::sessions_dir()` by default.

mod error;
mod session;
mod store;

pub use error::{Error, Result};
pub use session::Session;
pub use store::SessionStore;
