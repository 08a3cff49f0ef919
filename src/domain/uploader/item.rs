// Custom uploader item: one user-configured upload destination

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::template::Syntax;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// How the request body is built
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CustomUploaderBody {
    #[default]
    None,
    MultipartFormData,
    #[serde(rename = "FormURLEncoded")]
    FormUrlEncoded,
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "XML")]
    Xml,
    Binary,
}

/// Response handling of items written before response templates existed
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LegacyResponseType {
    #[default]
    Text,
    #[serde(rename = "RedirectionURL")]
    RedirectionUrl,
    Headers,
    LocationHeader,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct CustomUploaderItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub name: String,
    /// Comma separated, e.g. `ImageUploader, FileUploader`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_type: Option<String>,
    #[serde(alias = "RequestType")]
    pub request_method: HttpMethod,
    #[serde(rename = "RequestURL")]
    pub request_url: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    pub body: CustomUploaderBody,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub arguments: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub file_form_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data: String,
    #[serde(rename = "URL", skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(rename = "ThumbnailURL", skip_serializing_if = "String::is_empty")]
    pub thumbnail_url: String,
    #[serde(rename = "DeletionURL", skip_serializing_if = "String::is_empty")]
    pub deletion_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error_message: String,

    // Legacy fields, only read by migration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<LegacyResponseType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub regex_list: Vec<String>,
}

impl CustomUploaderItem {
    pub fn new(name: &str, request_url: &str) -> Self {
        Self {
            name: name.to_string(),
            request_url: request_url.to_string(),
            ..Default::default()
        }
    }

    /// Host name of the request URL, for diagnostics
    pub fn host(&self) -> String {
        let url = self.request_url.trim();
        let parsed = url::Url::parse(url).or_else(|_| url::Url::parse(&format!("https://{}", url)));
        parsed
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .filter(|host| !host.is_empty())
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn is_url_shortener(&self) -> bool {
        self.destination_type.as_deref().is_some_and(|types| {
            types
                .split(',')
                .any(|t| t.trim().eq_ignore_ascii_case("URLShortener"))
        })
    }

    /// Copy of the item with any query string of the request URL moved into
    /// the parameters. Configured parameters win over hoisted ones.
    pub fn normalized(&self, syntax: &Syntax) -> Self {
        let mut item = self.clone();
        let Some(pos) = query_start(&item.request_url, syntax) else {
            return item;
        };

        let query = item.request_url[pos + 1..].to_string();
        item.request_url.truncate(pos);

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = decode_component(name);
            if name.is_empty() {
                continue;
            }
            item.parameters
                .entry(name)
                .or_insert_with(|| decode_component(value));
        }

        item
    }
}

/// Position of the first `?` that is outside any function call
fn query_start(url: &str, syntax: &Syntax) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;

    for (pos, ch) in url.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == syntax.escape {
            escaped = true;
        } else if ch == syntax.start {
            depth += 1;
        } else if ch == syntax.end {
            depth = depth.saturating_sub(1);
        } else if ch == '?' && depth == 0 {
            return Some(pos);
        }
    }

    None
}

fn decode_component(text: &str) -> String {
    urlencoding::decode(text)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| text.to_string())
}
