use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Verified caller identity. `uid` scopes every metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserIdentity {
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}
