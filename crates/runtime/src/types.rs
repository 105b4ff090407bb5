//! Identifiers owned by the runtime.

use serde::{Deserialize, Serialize};

/// Runtime-local bout identifier, assigned when a bout request is accepted.
///
/// Distinct from the ledger's pool and fight ids, which only exist once the
/// corresponding ledger calls have succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoutId(pub u64);

impl std::fmt::Display for BoutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bout#{}", self.0)
    }
}
