// Escape-aware substitution
//
// Lets a flat substitution (the name tokens) run over template text without
// touching characters the author escaped for the template parser. Escape
// markers are kept so the parser still sees them afterwards.

use crate::error::TemplateResult;

/// Apply `substitute` to every unescaped run of `text`, re-emitting escaped
/// characters together with their escape marker.
pub fn apply_keeping_escapes<F>(text: &str, escape: char, mut substitute: F) -> TemplateResult<String>
where
    F: FnMut(&str) -> TemplateResult<String>,
{
    let mut output = String::with_capacity(text.len());
    let mut run = String::new();
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != escape {
            run.push(ch);
            continue;
        }

        if !run.is_empty() {
            output.push_str(&substitute(&run)?);
            run.clear();
        }

        output.push(ch);
        if let Some(escaped) = chars.next() {
            output.push(escaped);
        }
    }

    if !run.is_empty() {
        output.push_str(&substitute(&run)?);
    }

    Ok(output)
}
