use rolegrid_core::UserIdentity;
use rolegrid_domain::Permission;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub user_id: String,
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
    /// Permission slugs effective in the request's organization and branch.
    pub permissions: Vec<String>,
}

impl UserIdentityResponse {
    /// Creates a response from the identity and its effective permissions.
    #[must_use]
    pub fn from_identity_with_permissions(
        identity: &UserIdentity,
        permissions: Vec<Permission>,
    ) -> Self {
        Self {
            user_id: identity.user_id().to_string(),
            subject: identity.subject().to_owned(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(ToOwned::to_owned),
            permissions: permissions
                .iter()
                .map(|permission| permission.slug().to_owned())
                .collect(),
        }
    }
}

/// Keeps an explicit `null` distinct from an absent field.
pub(super) fn deserialize_present<'de, D, T>(
    deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
