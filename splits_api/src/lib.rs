pub mod client;
pub mod error;
pub mod poller;

pub use client::{SplitsApi, derive_status};
pub use error::ApiError;
pub use poller::{ActiveSplitsState, SplitsSnapshot, poll_active_splits};
