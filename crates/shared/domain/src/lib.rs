//! # Domain Models
//!
//! Pure types shared by every Masonry crate, with `serde` as the only dependency.
//! Keep it lean: no I/O, networking, or heavy logic. Just data and simple helpers.

pub mod config;
pub mod constants;
pub mod identity;
