// Upload transport: sends a compiled request and reports the response back in
// the shape the template functions read

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::domain::template::{ParseContext, ResponseInfo};
use crate::domain::uploader::{
    encode_pairs, CustomUploaderItem, HttpMethod, RequestBody, RequestPieces, TemplateCompiler,
    UploadResult,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// File contents being uploaded
#[derive(Debug, Clone)]
pub struct UploadData {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadData {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestPieces, file: Option<&UploadData>) -> Result<ResponseInfo>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn has_header(headers: &BTreeMap<String, String>, name: &str) -> bool {
    headers.keys().any(|key| key.eq_ignore_ascii_case(name))
}

/// Non-UTF-8 header bytes are replaced rather than dropped
fn collect_headers(map: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in map {
        headers
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    headers
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestPieces, file: Option<&UploadData>) -> Result<ResponseInfo> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        // Configured headers win over the body's default content type
        if let Some(content_type) = request.body.content_type() {
            if !has_header(&request.headers, CONTENT_TYPE.as_str()) {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
        }

        builder = match &request.body {
            RequestBody::None => builder,
            RequestBody::MultipartFormData {
                arguments,
                file_form_name,
            } => {
                let mut form = Form::new();
                for (name, value) in arguments {
                    form = form.text(name.clone(), value.clone());
                }
                if let (Some(form_name), Some(file)) = (file_form_name, file) {
                    let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
                    form = form.part(form_name.clone(), part);
                }
                builder.multipart(form)
            }
            RequestBody::FormUrlEncoded { arguments } => builder.body(encode_pairs(arguments)),
            RequestBody::Json { data } | RequestBody::Xml { data } => builder.body(data.clone()),
            RequestBody::Binary { .. } => {
                builder.body(file.map(|f| f.bytes.clone()).unwrap_or_default())
            }
        };

        debug!(
            method = request.method.as_str(),
            url = %request.url,
            "Sending upload request"
        );

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", request.url))?;

        let status = response.status();
        let response_url = response.url().to_string();
        let headers = collect_headers(response.headers());

        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        debug!(status = status.as_u16(), bytes = body.len(), "Received upload response");

        Ok(ResponseInfo {
            status_code: status.as_u16(),
            headers,
            body,
            response_url,
            is_success: status.is_success(),
        })
    }
}

/// Compile the request, send it, and read the result links from the response
pub async fn upload(
    compiler: &mut TemplateCompiler,
    item: &CustomUploaderItem,
    transport: &dyn Transport,
    file: Option<&UploadData>,
    input: Option<&str>,
) -> Result<UploadResult> {
    let context = ParseContext::for_request(file.map(|f| f.file_name.as_str()), input);
    let request = compiler.build_request(item, &context)?;
    let response = transport.send(&request, file).await?;
    Ok(compiler.extract_result(item, &response, &context))
}
