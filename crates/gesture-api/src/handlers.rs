//! Request handlers.

pub mod classify;
pub mod health;
pub mod sessions;

pub use classify::*;
pub use health::*;
pub use sessions::*;
