// Public API for integration tests and potential library usage

pub mod auth;
pub mod protocol;
pub mod receipt;
pub mod session;
pub mod state;
pub mod store;
pub mod types;
pub mod voter;
pub mod ws;
