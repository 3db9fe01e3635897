//! Messaging core: conversation resolution, the role-based access matrix,
//! message lifecycle and notification fan-out. Everything here is sync logic
//! over `dojo_db::Database`; the HTTP layer calls it through
//! `spawn_blocking`.

pub mod access;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod recipients;
pub mod threads;

pub use error::{Denial, MessagingError, Result};
