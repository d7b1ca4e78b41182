//! Per-user state that lives outside the install root: configuration and
//! download cache locations, and the archive cache itself.

pub mod cache;
pub mod utils;
