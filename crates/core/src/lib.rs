//! Core logic for Mirrorcut.
//!
//! This crate contains the upload pipeline with ZERO web framework dependencies.
//! Collaborators (object store, background removal provider) are reached through
//! narrow clients so the orchestration can be tested against in-process fakes.
//!
//! # Modules
//!
//! - `storage` - Object store client (put, delete, public URLs)
//! - `removal` - Background removal provider client
//! - `imaging` - Horizontal flip and PNG re-encode
//! - `pipeline` - Background removal followed by the flip
//! - `images` - Upload orchestration and record operations

pub mod images;
pub mod imaging;
pub mod pipeline;
pub mod removal;
pub mod storage;
