use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The authenticated owner of deployments.
///
/// Principals are issued by an external session layer; Bob only compares
/// them for equality. Aliases are unique per principal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Create a principal id. Surrounding whitespace is removed.
    pub fn new(id: impl AsRef<str>) -> Result<Self, TypeError> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(TypeError::EmptyPrincipal);
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrincipalId({})", self.0)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_whitespace() {
        let p = PrincipalId::new("  alice ").unwrap();
        assert_eq!(p.as_str(), "alice");
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(PrincipalId::new("   "), Err(TypeError::EmptyPrincipal));
    }

    #[test]
    fn display_is_raw_id() {
        assert_eq!(PrincipalId::new("user-42").unwrap().to_string(), "user-42");
    }
}
