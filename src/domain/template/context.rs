// Per-call data that template functions read from

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A completed HTTP response as seen by the template functions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub status_code: u16,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
    pub response_url: String,
    pub is_success: bool,
}

impl ResponseInfo {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            body: body.into(),
            response_url: String::new(),
            is_success: (200..300).contains(&status_code),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_response_url(mut self, url: impl Into<String>) -> Self {
        self.response_url = url.into();
        self
    }

    /// Case-insensitive header lookup; repeated headers are joined with ", "
    pub fn header(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .flat_map(|(_, values)| values.iter().map(String::as_str))
            .collect();

        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }
}

/// Read-only inputs for one parse call
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseContext<'a> {
    pub file_name: Option<&'a str>,
    pub input: Option<&'a str>,
    pub response: Option<&'a ResponseInfo>,
}

impl<'a> ParseContext<'a> {
    pub fn for_request(file_name: Option<&'a str>, input: Option<&'a str>) -> Self {
        Self {
            file_name,
            input,
            response: None,
        }
    }

    pub fn for_response(response: &'a ResponseInfo) -> Self {
        Self {
            file_name: None,
            input: None,
            response: Some(response),
        }
    }

    pub fn with_response(mut self, response: &'a ResponseInfo) -> Self {
        self.response = Some(response);
        self
    }
}
