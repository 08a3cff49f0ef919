// Small JSON path selector for the `json` template function

use anyhow::{anyhow, bail, Result};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Select a value by path: `$.data.files[0].url`, `files[0]['url']` or a
/// JSON pointer such as `/data/files/0/url`.
pub fn select<'v>(value: &'v Value, path: &str) -> Result<&'v Value> {
    let path = path.trim();

    if path.starts_with('/') {
        return value
            .pointer(path)
            .ok_or_else(|| anyhow!("JSON pointer \"{}\" did not match anything", path));
    }

    let mut current = value;
    for segment in parse_path(path)? {
        current = match (&segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        }
        .ok_or_else(|| anyhow!("JSON path \"{}\" did not match anything", path))?;
    }

    Ok(current)
}

/// Strings come back without quotes, everything else as compact JSON
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_path(path: &str) -> Result<Vec<Segment>> {
    let chars: Vec<char> = path.chars().collect();
    let mut segments = Vec::new();
    let mut pos = 0;

    if chars.first() == Some(&'$') {
        pos += 1;
    }

    while pos < chars.len() {
        match chars[pos] {
            '.' => {
                pos += 1;
                let key = read_key(&chars, &mut pos);
                if key.is_empty() {
                    bail!("Invalid JSON path \"{}\": empty key at position {}", path, pos);
                }
                segments.push(Segment::Key(key));
            }
            '[' => {
                pos += 1;
                segments.push(read_bracket(&chars, &mut pos, path)?);
            }
            _ if pos == 0 || (pos == 1 && chars[0] == '$') => {
                // Leading key without a dot, e.g. "data.url"
                let key = read_key(&chars, &mut pos);
                segments.push(Segment::Key(key));
            }
            ch => bail!(
                "Invalid JSON path \"{}\": unexpected '{}' at position {}",
                path,
                ch,
                pos
            ),
        }
    }

    Ok(segments)
}

fn read_key(chars: &[char], pos: &mut usize) -> String {
    let mut key = String::new();
    while let Some(&ch) = chars.get(*pos) {
        if ch == '.' || ch == '[' {
            break;
        }
        key.push(ch);
        *pos += 1;
    }
    key
}

fn read_bracket(chars: &[char], pos: &mut usize, path: &str) -> Result<Segment> {
    let segment = match chars.get(*pos) {
        Some(&quote) if quote == '\'' || quote == '"' => {
            *pos += 1;
            let mut key = String::new();
            loop {
                match chars.get(*pos) {
                    Some(&ch) if ch == quote => break,
                    Some(&ch) => key.push(ch),
                    None => bail!("Invalid JSON path \"{}\": unterminated quoted key", path),
                }
                *pos += 1;
            }
            *pos += 1;
            Segment::Key(key)
        }
        _ => {
            let mut digits = String::new();
            while let Some(&ch) = chars.get(*pos) {
                if ch == ']' {
                    break;
                }
                digits.push(ch);
                *pos += 1;
            }
            let index = digits.trim().parse::<usize>().map_err(|_| {
                anyhow!("Invalid JSON path \"{}\": \"{}\" is not an array index", path, digits)
            })?;
            Segment::Index(index)
        }
    };

    if chars.get(*pos) != Some(&']') {
        bail!("Invalid JSON path \"{}\": expected ']' at position {}", path, pos);
    }
    *pos += 1;

    Ok(segment)
}
