// Template compiler: turns an item plus a context into a request, and a
// response back into result links

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::item::{CustomUploaderBody, CustomUploaderItem};
use super::request::{encode_pairs, RequestBody, RequestPieces, UploadResult};
use crate::domain::naming::{NameParser, NameParserType};
use crate::domain::template::{
    json_escape, xml_escape, CustomUploaderParser, FunctionRegistry, OutputEncoding,
    ParseContext, ResponseInfo, Syntax,
};
use crate::error::TemplateError;

pub struct TemplateCompiler {
    registry: Arc<FunctionRegistry>,
    names: NameParser,
    syntax: Syntax,
}

impl TemplateCompiler {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            names: NameParser::new(NameParserType::Text),
            syntax: Syntax::default(),
        }
    }

    pub fn with_name_parser(mut self, names: NameParser) -> Self {
        self.names = names;
        self
    }

    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn name_parser(&self) -> &NameParser {
        &self.names
    }

    pub fn build_request(
        &mut self,
        item: &CustomUploaderItem,
        context: &ParseContext<'_>,
    ) -> Result<RequestPieces> {
        let item = item.normalized(&self.syntax);
        if item.request_url.trim().is_empty() {
            return Err(TemplateError::MissingField("RequestURL").into());
        }

        let url_parser = CustomUploaderParser::new(&self.registry, *context)
            .with_syntax(self.syntax)
            .with_encoding(OutputEncoding::Url);
        let mut url = url_parser
            .parse_with_names(&item.request_url, &mut self.names)
            .with_context(|| field_error(&item, "RequestURL"))?;
        if !has_scheme(&url) {
            url = format!("https://{}", url);
        }

        let parameters = self.parse_values(&item, "Parameters", &item.parameters, context)?;
        if !parameters.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&encode_pairs(&parameters));
        }

        let headers = self.parse_values(&item, "Headers", &item.headers, context)?;

        let body = match item.body {
            CustomUploaderBody::None => RequestBody::None,
            CustomUploaderBody::MultipartFormData => {
                let file_form_name = match context.file_name {
                    Some(_) if item.file_form_name.trim().is_empty() => {
                        return Err(TemplateError::MissingField("FileFormName").into());
                    }
                    Some(_) => Some(item.file_form_name.clone()),
                    None => None,
                };
                RequestBody::MultipartFormData {
                    arguments: self.parse_values(&item, "Arguments", &item.arguments, context)?,
                    file_form_name,
                }
            }
            CustomUploaderBody::FormUrlEncoded => RequestBody::FormUrlEncoded {
                arguments: self.parse_values(&item, "Arguments", &item.arguments, context)?,
            },
            CustomUploaderBody::Json => RequestBody::Json {
                data: self
                    .substitute_body(&item.data, context, json_escape)
                    .with_context(|| field_error(&item, "Data"))?,
            },
            CustomUploaderBody::Xml => RequestBody::Xml {
                data: self
                    .substitute_body(&item.data, context, xml_escape)
                    .with_context(|| field_error(&item, "Data"))?,
            },
            CustomUploaderBody::Binary => RequestBody::Binary {
                file_form_name: Some(item.file_form_name.clone()).filter(|name| !name.is_empty()),
            },
        };

        debug!(
            uploader = %item.name,
            method = item.request_method.as_str(),
            url = %url,
            "Built upload request"
        );

        Ok(RequestPieces {
            method: item.request_method,
            url,
            headers,
            body,
        })
    }

    fn parse_values(
        &mut self,
        item: &CustomUploaderItem,
        field: &str,
        values: &BTreeMap<String, String>,
        context: &ParseContext<'_>,
    ) -> Result<BTreeMap<String, String>> {
        let parser = CustomUploaderParser::new(&self.registry, *context).with_syntax(self.syntax);
        let mut parsed = BTreeMap::new();
        for (name, value) in values {
            let value = parser
                .parse_with_names(value, &mut self.names)
                .with_context(|| format!("{} \"{}\"", field_error(item, field), name))?;
            parsed.insert(name.clone(), value);
        }
        Ok(parsed)
    }

    /// JSON and XML bodies only get `{input}` and `{filename}` replaced, so
    /// the document's own braces are never read as function calls
    fn substitute_body(
        &mut self,
        data: &str,
        context: &ParseContext<'_>,
        escape: fn(&str) -> String,
    ) -> Result<String> {
        let data = self.names.parse_keeping_escapes(data, self.syntax.escape)?;

        let input_token = format!("{}input{}", self.syntax.start, self.syntax.end);
        let file_name_token = format!("{}filename{}", self.syntax.start, self.syntax.end);
        let input = escape(context.input.unwrap_or_default());
        let file_name = escape(context.file_name.unwrap_or_default());

        let mut output = String::with_capacity(data.len());
        let mut rest = data.as_str();
        loop {
            let next_input = rest.find(&input_token).map(|pos| (pos, &input_token, &input));
            let next_file = rest
                .find(&file_name_token)
                .map(|pos| (pos, &file_name_token, &file_name));
            let next = match (next_input, next_file) {
                (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
                (a, b) => a.or(b),
            };

            let Some((pos, token, value)) = next else {
                break;
            };
            output.push_str(&rest[..pos]);
            output.push_str(value);
            rest = &rest[pos + token.len()..];
        }
        output.push_str(rest);

        Ok(output)
    }

    /// Pull result links out of a response. Failures never abort: each one is
    /// recorded in `errors` and the remaining fields still resolve. Name
    /// tokens are left alone on this side.
    pub fn extract_result(
        &self,
        item: &CustomUploaderItem,
        response: &ResponseInfo,
        context: &ParseContext<'_>,
    ) -> UploadResult {
        let parser = CustomUploaderParser::new(&self.registry, context.with_response(response))
            .with_syntax(self.syntax);
        let host = item.host();
        let mut result = UploadResult::default();
        let mut extractor = FieldExtractor {
            parser: &parser,
            item,
            host: &host,
            errors: &mut result.errors,
        };

        if response.is_success {
            let url = if item.url.trim().is_empty() {
                Some(response.body.clone())
            } else {
                extractor.resolve("URL", &item.url)
            };
            let thumbnail_url = extractor.resolve("ThumbnailURL", &item.thumbnail_url);
            let deletion_url = extractor.resolve("DeletionURL", &item.deletion_url);

            if item.is_url_shortener() {
                result.shortened_url = url;
            } else {
                result.url = url;
            }
            result.thumbnail_url = thumbnail_url;
            result.deletion_url = deletion_url;
        } else {
            let message = extractor.resolve("ErrorMessage", &item.error_message);
            result.errors.push(format!(
                "{} ({}): host responded with status code {}",
                item.name, host, response.status_code
            ));
            if let Some(message) = message {
                result.errors.insert(0, message);
            }
        }

        debug!(
            uploader = %item.name,
            status = response.status_code,
            errors = result.errors.len(),
            "Extracted upload result"
        );

        result
    }
}

struct FieldExtractor<'p, 'a> {
    parser: &'p CustomUploaderParser<'a>,
    item: &'p CustomUploaderItem,
    host: &'p str,
    errors: &'p mut Vec<String>,
}

impl FieldExtractor<'_, '_> {
    /// Empty templates and empty results both come back as `None`
    fn resolve(&mut self, field: &str, template: &str) -> Option<String> {
        if template.trim().is_empty() {
            return None;
        }

        match self.parser.parse(template) {
            Ok(value) => Some(value).filter(|value| !value.is_empty()),
            Err(err) => {
                warn!(
                    uploader = %self.item.name,
                    host = self.host,
                    field,
                    error = %err,
                    "Failed to parse response field"
                );
                self.errors.push(format!(
                    "{} ({}): failed to parse {}: {}",
                    self.item.name, self.host, field, err
                ));
                None
            }
        }
    }
}

fn field_error(item: &CustomUploaderItem, field: &str) -> String {
    format!("{} ({}): invalid {}", item.name, item.host(), field)
}

fn has_scheme(url: &str) -> bool {
    url.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::uploader::item::HttpMethod;

    fn compiler() -> TemplateCompiler {
        TemplateCompiler::new(Arc::new(FunctionRegistry::new()))
    }

    #[test]
    fn test_url_gets_scheme_and_query() {
        let mut item = CustomUploaderItem::new("q", "example.com/api?key=abc");
        item.parameters.insert("text".to_string(), "{input}".to_string());

        let context = ParseContext::for_request(None, Some("a b&c"));
        let request = compiler().build_request(&item, &context).unwrap();
        assert_eq!(request.url, "https://example.com/api?key=abc&text=a%20b%26c");
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.body, RequestBody::None);
    }

    #[test]
    fn test_url_function_output_is_encoded() {
        let item = CustomUploaderItem::new("s", "https://s.example.com/{input}");
        let context = ParseContext::for_request(None, Some("x/y z"));
        let request = compiler().build_request(&item, &context).unwrap();
        assert_eq!(request.url, "https://s.example.com/x%2Fy%20z");
    }

    #[test]
    fn test_headers_and_arguments_are_interpreted() {
        let mut item = CustomUploaderItem::new("h", "https://h.example.com/upload");
        item.body = CustomUploaderBody::MultipartFormData;
        item.file_form_name = "file".to_string();
        item.headers.insert("X-Name".to_string(), "{filename}".to_string());
        item.arguments.insert("title".to_string(), "{input}!".to_string());

        let context = ParseContext::for_request(Some("shot.png"), Some("hi"));
        let request = compiler().build_request(&item, &context).unwrap();
        assert_eq!(request.headers["X-Name"], "shot.png");
        match request.body {
            RequestBody::MultipartFormData { arguments, file_form_name } => {
                assert_eq!(arguments["title"], "hi!");
                assert_eq!(file_form_name.as_deref(), Some("file"));
            }
            other => panic!("Expected multipart body, got {:?}", other),
        }
    }

    #[test]
    fn test_multipart_file_needs_form_name() {
        let mut item = CustomUploaderItem::new("m", "https://m.example.com");
        item.body = CustomUploaderBody::MultipartFormData;

        let context = ParseContext::for_request(Some("a.png"), None);
        let err = compiler().build_request(&item, &context).unwrap_err();
        assert!(err.to_string().contains("FileFormName"));

        let text_only = ParseContext::for_request(None, Some("text"));
        assert!(compiler().build_request(&item, &text_only).is_ok());
    }

    #[test]
    fn test_missing_request_url() {
        let item = CustomUploaderItem::new("empty", "  ");
        let err = compiler().build_request(&item, &ParseContext::default()).unwrap_err();
        assert!(err.to_string().contains("RequestURL"));
    }

    #[test]
    fn test_bad_header_names_the_field() {
        let mut item = CustomUploaderItem::new("bad", "https://bad.example.com");
        item.headers.insert("Authorization".to_string(), "{nope}".to_string());

        let err = compiler().build_request(&item, &ParseContext::default()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Headers \"Authorization\""));
        assert!(message.contains("bad.example.com"));
        assert!(message.contains("Invalid function name: nope"));
    }

    #[test]
    fn test_json_body_escapes_values() {
        let mut item = CustomUploaderItem::new("j", "https://j.example.com");
        item.body = CustomUploaderBody::Json;
        item.data = r#"{"text":"{input}","file":"{filename}"}"#.to_string();

        let context = ParseContext::for_request(Some("a.png"), Some("say \"{filename}\""));
        let request = compiler().build_request(&item, &context).unwrap();
        assert_eq!(
            request.body,
            RequestBody::Json {
                data: r#"{"text":"say \"{filename}\"","file":"a.png"}"#.to_string()
            }
        );
        assert_eq!(request.body.content_type(), Some("application/json"));
    }

    #[test]
    fn test_xml_body_escapes_values() {
        let mut item = CustomUploaderItem::new("x", "https://x.example.com");
        item.body = CustomUploaderBody::Xml;
        item.data = "<text>{input}</text>".to_string();

        let context = ParseContext::for_request(None, Some("a<b"));
        let request = compiler().build_request(&item, &context).unwrap();
        assert_eq!(
            request.body,
            RequestBody::Xml {
                data: "<text>a&lt;b</text>".to_string()
            }
        );
    }

    #[test]
    fn test_extract_result_on_success() {
        let mut item = CustomUploaderItem::new("ok", "https://ok.example.com");
        item.url = "{json:link}".to_string();
        item.deletion_url = "{json:delete}".to_string();
        item.thumbnail_url = "{json:thumb}".to_string();

        let response = ResponseInfo::new(
            200,
            r#"{"link":"https://ok.example.com/a","delete":"https://ok.example.com/d"}"#,
        );
        let result = compiler().extract_result(&item, &response, &ParseContext::default());

        assert_eq!(result.url.as_deref(), Some("https://ok.example.com/a"));
        assert_eq!(result.deletion_url.as_deref(), Some("https://ok.example.com/d"));
        assert_eq!(result.thumbnail_url, None);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("ok.example.com"));
        assert!(result.errors[0].contains("ThumbnailURL"));
    }

    #[test]
    fn test_empty_url_pattern_uses_body() {
        let item = CustomUploaderItem::new("raw", "https://raw.example.com");
        let response = ResponseInfo::new(200, "https://raw.example.com/x");
        let result = compiler().extract_result(&item, &response, &ParseContext::default());
        assert_eq!(result.url.as_deref(), Some("https://raw.example.com/x"));
        assert!(!result.has_errors());
    }

    #[test]
    fn test_shortener_result() {
        let mut item = CustomUploaderItem::new("short", "https://short.example.com");
        item.destination_type = Some("URLShortener".to_string());
        item.url = "{response}".to_string();

        let response = ResponseInfo::new(200, "https://sho.rt/x");
        let result = compiler().extract_result(&item, &response, &ParseContext::default());
        assert_eq!(result.shortened_url.as_deref(), Some("https://sho.rt/x"));
        assert_eq!(result.url, None);
    }

    #[test]
    fn test_extract_result_on_failure() {
        let mut item = CustomUploaderItem::new("fail", "https://fail.example.com");
        item.error_message = "{json:error.message}".to_string();

        let response = ResponseInfo::new(413, r#"{"error":{"message":"File too large"}}"#);
        let result = compiler().extract_result(&item, &response, &ParseContext::default());

        assert_eq!(result.url, None);
        assert_eq!(result.errors[0], "File too large");
        assert!(result.errors[1].contains("status code 413"));
    }

    #[test]
    fn test_custom_syntax_reaches_every_stage() {
        let syntax = Syntax::new('<', '>', '=', ',', '^').unwrap();
        let mut compiler = compiler().with_syntax(syntax);

        let mut item = CustomUploaderItem::new("angle", "example.com/<filename>/{raw}?a=<input>&b=1");
        item.url = "<json=link>?from=<header=X-Host>".to_string();

        let context = ParseContext::for_request(Some("x y.png"), Some("v"));
        let request = compiler.build_request(&item, &context).unwrap();
        assert_eq!(request.url, "https://example.com/x%20y.png/{raw}?a=v&b=1");

        let response = ResponseInfo::new(200, r#"{"link":"https://cdn.example.com/1"}"#)
            .with_header("x-host", "edge");
        let result = compiler.extract_result(&item, &response, &context);
        assert_eq!(result.url.as_deref(), Some("https://cdn.example.com/1?from=edge"));
    }

    #[test]
    fn test_response_patterns_keep_name_tokens() {
        let mut item = CustomUploaderItem::new("tokens", "https://tokens.example.com");
        item.url = "{response}?n=%i&y=%y".to_string();
        item.deletion_url = "%d/{response}".to_string();

        let names = NameParser::new(NameParserType::Text).with_auto_increment_number(3);
        let compiler = compiler().with_name_parser(names);
        let response = ResponseInfo::new(200, "x.png");
        let result = compiler.extract_result(&item, &response, &ParseContext::default());

        assert_eq!(result.url.as_deref(), Some("x.png?n=%i&y=%y"));
        assert_eq!(result.deletion_url.as_deref(), Some("%d/x.png"));
        assert_eq!(compiler.name_parser().auto_increment_number, 3);
    }

    #[test]
    fn test_json_body_input_is_not_token_expanded() {
        let mut item = CustomUploaderItem::new("json", "https://json.example.com");
        item.body = CustomUploaderBody::Json;
        item.data = r#"{"text":"{input}","n":"%i"}"#.to_string();

        let mut compiler = compiler();
        let context = ParseContext::for_request(Some("%y.png"), Some("100% of %y and %i"));
        let request = compiler.build_request(&item, &context).unwrap();

        assert_eq!(
            request.body,
            RequestBody::Json {
                data: r#"{"text":"100% of %y and %i","n":"1"}"#.to_string()
            }
        );
        assert_eq!(compiler.name_parser().auto_increment_number, 1);
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://x.com"));
        assert!(has_scheme("ftp://x.com"));
        assert!(!has_scheme("x.com/a?u=https://y.com"));
        assert!(!has_scheme("x.com"));
    }
}
