//! The authenticated caller, threaded explicitly through every operation.

use serde::{Deserialize, Serialize};

use crate::model::{Principal, PrincipalId, Role};

/// Who is making the request. Produced by the authenticator, consumed by the
/// services; there is no ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub principal_id: PrincipalId,
  pub name:         String,
  pub roles:        Vec<Role>,
}

impl From<&Principal> for Identity {
  fn from(p: &Principal) -> Self {
    Self {
      principal_id: p.id,
      name:         p.name.clone(),
      roles:        vec![p.role],
    }
  }
}
