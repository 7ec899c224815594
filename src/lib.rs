//! Media upload intake: byte-level sniffing, image normalization and storage
//!
//! Uploaded blobs are classified from their magic numbers (never from their
//! names), images are re-encoded as compressed JPEG, videos have their
//! duration read from the `mvhd` header, and everything is stored under a
//! generated name.

pub mod error;
pub mod image;
pub mod media;
pub mod models;
pub mod naming;
pub mod pipeline;
pub mod storage;

pub use error::{Error, MediaError, Result};
