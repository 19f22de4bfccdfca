pub mod api;
pub mod boundaries;
