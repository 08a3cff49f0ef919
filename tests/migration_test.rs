// Integration tests for migrating destinations written with older syntaxes

use custom_uploader::domain::uploader::{needs_migration, CustomUploaderBody, CURRENT_VERSION};
use custom_uploader::{migrate, CustomUploaderItem, ParseContext, ResponseInfo};

mod common;

fn load(json: &str) -> CustomUploaderItem {
    serde_json::from_str(json).expect("valid destination")
}

const DOLLAR_SYNTAX_ITEM: &str = r#"{
    "Version": "13.1.0",
    "Name": "Old host",
    "DestinationType": "ImageUploader",
    "RequestMethod": "POST",
    "RequestURL": "https://old.example.com/api/upload",
    "Body": "MultipartFormData",
    "FileFormName": "image",
    "Arguments": {"title": "$filename$"},
    "Headers": {"Authorization": "Bearer \\$secret"},
    "RegexList": ["\"id\":\"(\\w+)\""],
    "URL": "https://old.example.com/$regex:1|1$",
    "DeletionURL": "$json:delete$",
    "ErrorMessage": "$json:error"
}"#;

#[test]
fn test_dollar_syntax_round_trip() {
    let item = migrate(load(DOLLAR_SYNTAX_ITEM));

    assert_eq!(item.version.as_deref(), Some(CURRENT_VERSION));
    assert_eq!(item.arguments["title"], "{filename}");
    assert_eq!(item.headers["Authorization"], "Bearer $secret");
    assert_eq!(item.deletion_url, "{json:delete}");
    assert_eq!(item.error_message, "{json:error}");
    assert!(item.regex_list.is_empty());

    let mut compiler = common::compiler();
    let context = ParseContext::for_request(Some("a.png"), None);
    let request = compiler.build_request(&item, &context).unwrap();
    assert_eq!(request.headers["Authorization"], "Bearer $secret");

    let response = ResponseInfo::new(
        200,
        r#"{"id":"abc123","delete":"https://old.example.com/d/abc123"}"#,
    );
    let result = compiler.extract_result(&item, &response, &context);
    assert_eq!(result.url.as_deref(), Some("https://old.example.com/abc123"));
    assert_eq!(result.deletion_url.as_deref(), Some("https://old.example.com/d/abc123"));
    assert!(result.errors.is_empty());
}

#[test]
fn test_legacy_location_header_item() {
    let item = migrate(load(
        r#"{
            "Name": "Legacy",
            "RequestType": "GET",
            "RequestURL": "https://legacy.example.com/shorten",
            "Arguments": {"url": "$input$"},
            "ResponseType": "LocationHeader"
        }"#,
    ));

    assert_eq!(item.body, CustomUploaderBody::None);
    assert_eq!(item.url, "{header:Location}");
    assert!(item.arguments.is_empty());

    let mut compiler = common::compiler();
    let context = ParseContext::for_request(None, Some("https://example.com"));
    let request = compiler.build_request(&item, &context).unwrap();
    assert_eq!(
        request.url,
        "https://legacy.example.com/shorten?url=https%3A%2F%2Fexample.com"
    );

    let response = ResponseInfo::new(201, "").with_header("location", "https://sho.rt/x");
    let result = compiler.extract_result(&item, &response, &context);
    assert_eq!(result.url.as_deref(), Some("https://sho.rt/x"));
}

#[test]
fn test_migration_is_idempotent() {
    let once = migrate(load(DOLLAR_SYNTAX_ITEM));
    assert!(!needs_migration(&once));
    assert_eq!(migrate(once.clone()), once);
}

#[test]
fn test_literal_braces_survive_migration() {
    let item = migrate(load(
        r#"{"Version": "13.0.0", "Name": "b", "RequestURL": "https://b.example.com", "URL": "{\"a\"}$response$"}"#,
    ));
    assert_eq!(item.url, "\\{\"a\"\\}{response}");

    let mut compiler = common::compiler();
    let response = ResponseInfo::new(200, "!");
    let result = compiler.extract_result(&item, &response, &ParseContext::default());
    assert_eq!(result.url.as_deref(), Some("{\"a\"}!"));
}
