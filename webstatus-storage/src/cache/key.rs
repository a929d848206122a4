//! Cache key derivation.

use std::fmt;

use serde::Serialize;
use webstatus_core::CacheResult;

/// Key of one cached operation response.
///
/// Format: `{operation_id}-{json}` where `json` is the compact
/// `serde_json` encoding of the request descriptor. Struct fields encode in
/// declaration order, so descriptors with map-valued parameters must use an
/// ordered map (`BTreeMap`) to keep keys deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `request` under `operation_id`.
    pub fn derive<K: Serialize + ?Sized>(operation_id: &str, request: &K) -> CacheResult<Self> {
        let json = serde_json::to_string(request)?;
        Ok(Self(format!("{operation_id}-{json}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
