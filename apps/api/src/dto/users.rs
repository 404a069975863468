use std::str::FromStr;

use rolegrid_application::{SortOrder, UserPage, UserSort, UserSortField};
use rolegrid_core::AppError;
use rolegrid_domain::UserAccount;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::deserialize_present;

const DEFAULT_PER_PAGE: u32 = 15;

/// Query string of the users directory.
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    /// One of `name`, `email`, `created_at`, `updated_at`.
    #[serde(default)]
    pub sort: Option<String>,
    /// `asc` or `desc`.
    #[serde(default)]
    pub order: Option<String>,
}

impl UserListParams {
    /// Page number, starting at one.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// Requested page size before clamping.
    #[must_use]
    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE)
    }

    /// Requested ordering, defaulting to name ascending.
    pub fn sort(&self) -> Result<UserSort, AppError> {
        Ok(UserSort {
            field: self
                .sort
                .as_deref()
                .map(UserSortField::from_str)
                .transpose()?
                .unwrap_or_default(),
            order: self
                .order
                .as_deref()
                .map(SortOrder::from_str)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

/// Incoming payload for user creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-user-request.ts"
)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    #[ts(optional)]
    pub console_user_id: Option<String>,
}

/// Incoming payload for user updates. Absent fields are left unchanged and
/// `console_user_id: null` unlinks the user.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-user-request.ts"
)]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[ts(optional)]
    pub name: Option<String>,
    #[serde(default)]
    #[ts(optional)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[ts(optional)]
    pub console_user_id: Option<Option<String>>,
}

/// API representation of a mirrored SSO user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/user-response.ts"
)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub console_user_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Pagination metadata.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/page-meta-response.ts"
)]
pub struct PageMetaResponse {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    #[ts(type = "number")]
    pub total: u64,
}

/// One page of users.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/user-page-response.ts"
)]
pub struct UserPageResponse {
    pub data: Vec<UserResponse>,
    pub meta: PageMetaResponse,
}

impl From<UserAccount> for UserResponse {
    fn from(value: UserAccount) -> Self {
        Self {
            id: value.user_id.to_string(),
            name: value.name,
            email: value.email,
            console_user_id: value.console_user_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl UserPageResponse {
    /// Builds a page response. `page` and `per_page` must already be clamped.
    #[must_use]
    pub fn new(page: UserPage, current_page: u32, per_page: u32) -> Self {
        let pages = page.total.div_ceil(u64::from(per_page.max(1)));
        Self {
            data: page.users.into_iter().map(UserResponse::from).collect(),
            meta: PageMetaResponse {
                current_page,
                last_page: u32::try_from(pages).unwrap_or(u32::MAX).max(1),
                per_page,
                total: page.total,
            },
        }
    }
}
