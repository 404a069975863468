use serde::Deserialize;
use ts_rs::TS;

/// Operator bootstrap login payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bootstrap-request.ts"
)]
pub struct BootstrapRequest {
    pub email: String,
    pub token: String,
}
