//! Bundle hashing for Bob.
//!
//! An artifact's identity is the SHA-256 digest of the raw bundle bytes the
//! client uploaded. Clients declare that digest alongside the upload; the
//! server never trusts the claim and recomputes it with [`BundleHasher`].

pub mod hasher;

pub use hasher::{BundleHasher, HashError};
