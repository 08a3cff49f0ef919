// Helpers for the name parser: token scanning, base conversion, random
// characters, sanitization and environment lookups

use rand::Rng;

use crate::error::TemplateResult;

/// Replace every occurrence of `token`, optionally followed by `{argument}`.
///
/// The braces only count as an argument when `accepts` agrees; otherwise they
/// stay in the text untouched. Replacements are never re-scanned.
pub fn replace_token<F>(
    text: &str,
    token: &str,
    accepts: fn(&str) -> bool,
    mut replacement: F,
) -> TemplateResult<String>
where
    F: FnMut(Option<&str>) -> TemplateResult<String>,
{
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(token) {
        output.push_str(&rest[..pos]);
        rest = &rest[pos + token.len()..];

        let argument = rest
            .strip_prefix('{')
            .and_then(|inner| inner.find('}').map(|end| &inner[..end]))
            .filter(|argument| accepts(argument));
        if let Some(argument) = argument {
            rest = &rest[argument.len() + 2..];
        }

        output.push_str(&replacement(argument)?);
    }

    output.push_str(rest);
    Ok(output)
}

/// Like [`replace_token`], for tokens taking `{n}` or `{n,m}` arguments
pub fn replace_numeric_token<F>(text: &str, token: &str, mut replacement: F) -> TemplateResult<String>
where
    F: FnMut(&[usize]) -> TemplateResult<String>,
{
    replace_token(text, token, is_number_list, |argument| {
        let numbers: Vec<usize> = argument
            .map(|a| a.split(',').filter_map(|n| n.trim().parse().ok()).collect())
            .unwrap_or_default();
        replacement(&numbers)
    })
}

fn is_number_list(argument: &str) -> bool {
    !argument.is_empty()
        && argument
            .split(',')
            .all(|n| n.trim().parse::<usize>().is_ok())
}

pub fn any_argument(_argument: &str) -> bool {
    true
}

pub fn no_argument(_argument: &str) -> bool {
    false
}

/// Convert `value` to `base` using the first `base` characters of `alphabet`
pub fn to_base(mut value: u64, base: usize, alphabet: &str) -> String {
    let digits: Vec<char> = alphabet.chars().take(base).collect();
    let base = digits.len() as u64;
    if value == 0 || base < 2 {
        return digits.first().map(|d| d.to_string()).unwrap_or_default();
    }

    let mut output = Vec::new();
    while value > 0 {
        output.push(digits[(value % base) as usize]);
        value /= base;
    }
    output.iter().rev().collect()
}

/// Upper bound for `{width}` and `{count}` token arguments
pub const MAX_GENERATED_LENGTH: usize = 1024;

pub fn pad_zeroes(text: &str, width: usize) -> String {
    format!("{:0>width$}", text, width = width.min(MAX_GENERATED_LENGTH))
}

pub fn random_string(alphabet: &str, count: usize) -> String {
    let chars: Vec<char> = alphabet.chars().collect();
    let mut rng = rand::rng();
    (0..count.min(MAX_GENERATED_LENGTH))
        .map(|_| chars[rng.random_range(0..chars.len())])
        .collect()
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

const INVALID_FILE_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];
const INVALID_PATH_CHARS: &[char] = &['"', '<', '>', '|'];

pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|ch| !ch.is_control() && !INVALID_FILE_NAME_CHARS.contains(ch))
        .collect()
}

pub fn sanitize_path(path: &str) -> String {
    path.chars()
        .filter(|ch| !ch.is_control() && !INVALID_PATH_CHARS.contains(ch))
        .collect()
}

/// Percent-encode everything that cannot appear in a URL as-is
pub fn sanitize_url(url: &str) -> String {
    const ALLOWED: &str = "-._~:/?#[]@!$&'()*+,;=%";
    let mut output = String::with_capacity(url.len());
    for ch in url.chars() {
        if ch.is_ascii_alphanumeric() || ALLOWED.contains(ch) {
            output.push(ch);
        } else {
            output.push_str(&urlencoding::encode(ch.encode_utf8(&mut [0; 4])));
        }
    }
    output
}

fn env_first(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
}

pub fn user_name() -> String {
    env_first(&["USER", "USERNAME"]).unwrap_or_default()
}

pub fn login_name() -> String {
    env_first(&["LOGNAME", "USER", "USERNAME"]).unwrap_or_default()
}

pub fn machine_name() -> String {
    env_first(&["HOSTNAME", "COMPUTERNAME"])
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|name| name.trim().to_string())
        })
        .unwrap_or_default()
}

pub fn line_separator() -> &'static str {
    if cfg!(windows) {
        "\r\n"
    } else {
        "\n"
    }
}
