// Migration of items written against older template syntaxes
//
// Items up to 12.3.1 used a response type instead of response templates and
// carried no body mode. Items up to 13.7.1 wrote function calls as `$name$`
// and referenced a separate regex list. Both are rewritten into the current
// `{name}` syntax; newer items pass through untouched.

use std::cmp::Ordering;
use tracing::debug;

use super::item::{CustomUploaderBody, CustomUploaderItem, HttpMethod, LegacyResponseType};
use crate::domain::template::Syntax;

pub const LEGACY_VERSION: &str = "12.3.1";
pub const DOLLAR_SYNTAX_VERSION: &str = "13.7.1";
pub const CURRENT_VERSION: &str = "14.0.0";

const HEADERS_DEPRECATED: &str =
    "Response type option is deprecated, please use {header:header_name} syntax instead.";

/// Compare dotted version strings numerically; missing parts count as zero
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parts = |v: &str| -> Vec<u64> {
        v.trim()
            .split('.')
            .map(|part| part.trim().parse().unwrap_or(0))
            .collect()
    };
    let (a, b) = (parts(a), parts(b));

    for i in 0..a.len().max(b.len()) {
        let ordering = a.get(i).unwrap_or(&0).cmp(b.get(i).unwrap_or(&0));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn is_at_most(version: Option<&str>, limit: &str) -> bool {
    version.map_or(true, |v| compare_versions(v, limit) != Ordering::Greater)
}

pub fn needs_migration(item: &CustomUploaderItem) -> bool {
    item.version
        .as_deref()
        .map_or(true, |v| compare_versions(v, CURRENT_VERSION) == Ordering::Less)
}

/// Bring an item up to the current version
pub fn migrate(mut item: CustomUploaderItem) -> CustomUploaderItem {
    if !needs_migration(&item) {
        return item;
    }

    let version = item.version.clone();

    if is_at_most(version.as_deref(), LEGACY_VERSION) {
        migrate_legacy(&mut item);
    }

    if is_at_most(version.as_deref(), DOLLAR_SYNTAX_VERSION) {
        migrate_dollar_fields(&mut item);
    }

    debug!(
        name = %item.name,
        from = version.as_deref().unwrap_or("unknown"),
        to = CURRENT_VERSION,
        "Migrated custom uploader"
    );

    item.version = Some(CURRENT_VERSION.to_string());
    item
}

fn migrate_legacy(item: &mut CustomUploaderItem) {
    if item.request_method == HttpMethod::Post {
        item.body = CustomUploaderBody::MultipartFormData;
    } else {
        item.body = CustomUploaderBody::None;
        for (name, value) in std::mem::take(&mut item.arguments) {
            item.parameters.entry(name).or_insert(value);
        }
    }

    match item.response_type.take() {
        Some(LegacyResponseType::RedirectionUrl) => {
            replace_response_reference(item, "$responseurl$");
        }
        Some(LegacyResponseType::LocationHeader) => {
            replace_response_reference(item, "$header:Location$");
        }
        Some(LegacyResponseType::Headers) => {
            // Braces are literal here; the dollar rewrite escapes them
            item.url = HEADERS_DEPRECATED.to_string();
        }
        Some(LegacyResponseType::Text) | None => {}
    }
}

fn replace_response_reference(item: &mut CustomUploaderItem, replacement: &str) {
    if item.url.is_empty() {
        item.url = replacement.to_string();
    }
    for field in [&mut item.url, &mut item.thumbnail_url, &mut item.deletion_url] {
        *field = field.replace("$response$", replacement);
    }
}

fn migrate_dollar_fields(item: &mut CustomUploaderItem) {
    let syntax = Syntax::default();
    let regex_list = std::mem::take(&mut item.regex_list);
    let rewrite = |text: &str| {
        let rewritten = migrate_dollar_syntax(text, &syntax);
        inline_regex_references(&rewritten, &regex_list, &syntax)
    };

    item.request_url = rewrite(&item.request_url);
    for map in [&mut item.parameters, &mut item.headers, &mut item.arguments] {
        for value in map.values_mut() {
            *value = rewrite(value);
        }
    }
    item.data = rewrite(&item.data);
    item.url = rewrite(&item.url);
    item.thumbnail_url = rewrite(&item.thumbnail_url);
    item.deletion_url = rewrite(&item.deletion_url);
    item.error_message = rewrite(&item.error_message);
}

/// Rewrite `$name:param|param$` calls into the current syntax in one pass.
///
/// A backslash passes its next character through literally; characters that
/// are special in the current syntax get re-escaped. A call still open at the
/// end of the text is closed there.
pub fn migrate_dollar_syntax(text: &str, syntax: &Syntax) -> String {
    let mut output = String::with_capacity(text.len() + 8);
    let mut in_call = false;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(next) => push_literal(&mut output, next, syntax),
                None => push_literal(&mut output, '\\', syntax),
            },
            '$' => {
                output.push(if in_call { syntax.end } else { syntax.start });
                in_call = !in_call;
            }
            _ if ch == syntax.parameter_delimiter && in_call => output.push(ch),
            _ => push_literal(&mut output, ch, syntax),
        }
    }

    if in_call {
        output.push(syntax.end);
    }

    output
}

fn push_literal(output: &mut String, ch: char, syntax: &Syntax) {
    // `:` only means something right after a function name
    if syntax.is_special(ch) && ch != syntax.parameter_start {
        output.push(syntax.escape);
    }
    output.push(ch);
}

/// Replace `{regex:N` references (1-based) with the escaped pattern they
/// pointed at. Out-of-range references are left alone.
fn inline_regex_references(text: &str, regex_list: &[String], syntax: &Syntax) -> String {
    if regex_list.is_empty() {
        return text.to_string();
    }

    let prefix = format!("{}regex{}", syntax.start, syntax.parameter_start);
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(&prefix) {
        output.push_str(&rest[..pos + prefix.len()]);
        rest = &rest[pos + prefix.len()..];

        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        let terminated = rest[digits..]
            .chars()
            .next()
            .is_some_and(|c| c == syntax.parameter_delimiter || c == syntax.end);

        let pattern = rest[..digits]
            .parse::<usize>()
            .ok()
            .filter(|_| terminated)
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| regex_list.get(index));

        if let Some(pattern) = pattern {
            output.push_str(&syntax.escape_text(pattern));
            rest = &rest[digits..];
        }
    }

    output.push_str(rest);
    output
}
