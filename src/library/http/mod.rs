//! Helpers for serving JSON over HTTP with [`warp`]

mod reply;

pub use reply::{error_response, json_response, recover_rejection};
