// Compiled request and extracted result

use serde::Serialize;
use std::collections::BTreeMap;

use super::item::HttpMethod;

/// Everything the transport needs to send one upload request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestPieces {
    pub method: HttpMethod,
    /// Full URL including the query string
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBody {
    None,
    MultipartFormData {
        arguments: BTreeMap<String, String>,
        /// Absent when only text is being sent
        file_form_name: Option<String>,
    },
    FormUrlEncoded {
        arguments: BTreeMap<String, String>,
    },
    Json {
        data: String,
    },
    Xml {
        data: String,
    },
    Binary {
        file_form_name: Option<String>,
    },
}

impl RequestBody {
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            RequestBody::None | RequestBody::MultipartFormData { .. } => None,
            RequestBody::FormUrlEncoded { .. } => Some("application/x-www-form-urlencoded"),
            RequestBody::Json { .. } => Some("application/json"),
            RequestBody::Xml { .. } => Some("application/xml"),
            RequestBody::Binary { .. } => Some("application/octet-stream"),
        }
    }
}

/// `name=value` pairs joined with `&`, both sides percent-encoded
pub fn encode_pairs(pairs: &BTreeMap<String, String>) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{}={}", urlencoding::encode(name), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Links pulled out of a response, plus diagnostics for whatever failed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadResult {
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub deletion_url: Option<String>,
    pub shortened_url: Option<String>,
    pub errors: Vec<String>,
}

impl UploadResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
