//! Wire format of the storage signing endpoints

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct SignRequest {
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignBatchRequest<'a> {
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
    pub paths: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignResponse {
    #[serde(rename = "signedURL")]
    pub signed_url: Option<String>,
}

/// One entry of the batch signing response
#[derive(Debug, Deserialize)]
pub(crate) struct SignedEntry {
    pub path: Option<String>,
    #[serde(rename = "signedURL")]
    pub signed_url: Option<String>,
    pub error: Option<String>,
}
