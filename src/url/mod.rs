//! URL handling module for Link-Matrix
//!
//! This module provides URL resolution, page identity keys and the
//! same-domain test used to decide which links count as internal.

mod domain;
mod normalize;

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

// Re-export main functions
pub use domain::{host_key, same_domain, same_host};
pub use normalize::{canonical_key, resolve};

/// Identity of a page inside the link graph
///
/// A key is the lowercase host (without a leading `www.`) followed by the
/// lowercase path with trailing slashes removed. Query strings and fragments
/// are not part of the identity, so `https://www.example.com/a/?x=1` and
/// `http://example.com/a` share the key `example.com/a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the key of an empty or blank URL
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NormalizedKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<NormalizedKey> for String {
    fn from(key: NormalizedKey) -> Self {
        key.0
    }
}
