//! Forwarding to the backend: path rewrite, body policy, response translation.

pub mod body;
pub mod error;
pub mod forward;
pub mod request_id;
pub mod response;
pub mod rewrite;
