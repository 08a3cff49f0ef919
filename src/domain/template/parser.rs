// Template parser using recursive descent
//
// Function calls are resolved while parsing; no AST is kept around. Each
// recursive call hands back its own output together with the index of the
// character it stopped on.

use crate::error::{TemplateError, TemplateResult};

/// The five characters that give template text its structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Syntax {
    pub start: char,
    pub end: char,
    pub parameter_start: char,
    pub parameter_delimiter: char,
    pub escape: char,
}

impl Syntax {
    pub fn new(
        start: char,
        end: char,
        parameter_start: char,
        parameter_delimiter: char,
        escape: char,
    ) -> TemplateResult<Self> {
        let chars = [start, end, parameter_start, parameter_delimiter, escape];
        for (i, ch) in chars.iter().enumerate() {
            if chars[i + 1..].contains(ch) {
                return Err(TemplateError::InvalidSyntax(format!(
                    "syntax character '{}' is used more than once",
                    ch
                )));
            }
        }

        Ok(Self {
            start,
            end,
            parameter_start,
            parameter_delimiter,
            escape,
        })
    }

    pub fn is_special(&self, ch: char) -> bool {
        ch == self.start
            || ch == self.end
            || ch == self.parameter_start
            || ch == self.parameter_delimiter
            || ch == self.escape
    }

    /// Escape every syntax character so the text parses back to itself
    pub fn escape_text(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for ch in text.chars() {
            if self.is_special(ch) {
                escaped.push(self.escape);
            }
            escaped.push(ch);
        }
        escaped
    }
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            start: '{',
            end: '}',
            parameter_start: ':',
            parameter_delimiter: '|',
            escape: '\\',
        }
    }
}

/// Whatever resolves a function name plus its parameters into text
pub trait FunctionCaller {
    fn call_function(&self, name: &str, parameters: &[String]) -> TemplateResult<String>;
}

impl<F> FunctionCaller for F
where
    F: Fn(&str, &[String]) -> TemplateResult<String>,
{
    fn call_function(&self, name: &str, parameters: &[String]) -> TemplateResult<String> {
        self(name, parameters)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyntaxParser {
    syntax: Syntax,
}

impl SyntaxParser {
    pub fn new(syntax: Syntax) -> Self {
        Self { syntax }
    }

    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    pub fn parse(&self, text: &str, caller: &dyn FunctionCaller) -> TemplateResult<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let chars: Vec<char> = text.chars().collect();
        let (output, _) = self.parse_span(&chars, false, 0, caller)?;
        Ok(output)
    }

    fn parse_span(
        &self,
        text: &[char],
        is_function: bool,
        start: usize,
        caller: &dyn FunctionCaller,
    ) -> TemplateResult<(String, usize)> {
        let syntax = &self.syntax;
        let mut output = String::new();
        let mut escape = false;
        let mut i = start;

        while i < text.len() {
            let ch = text[i];

            if !escape {
                if ch == syntax.start {
                    let (parsed, end) = self.parse_span(text, true, i + 1, caller)?;
                    output.push_str(&parsed);
                    // Step past the terminator the nested call stopped on
                    i = end + 1;
                    continue;
                } else if ch == syntax.end || ch == syntax.parameter_delimiter {
                    break;
                } else if ch == syntax.escape {
                    escape = true;
                    i += 1;
                    continue;
                } else if is_function && ch == syntax.parameter_start {
                    let mut parameters = Vec::new();
                    loop {
                        let (parsed, end) = self.parse_span(text, false, i + 1, caller)?;
                        parameters.push(parsed);
                        i = end;
                        if i >= text.len() || text[i] != syntax.parameter_delimiter {
                            break;
                        }
                    }

                    let result = caller.call_function(&output, &parameters)?;
                    return Ok((result, i.min(text.len())));
                }
            }

            escape = false;
            output.push(ch);
            i += 1;
        }

        let end = i.min(text.len());
        if is_function {
            Ok((caller.call_function(&output, &[])?, end))
        } else {
            Ok((output, end))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn echo(name: &str, parameters: &[String]) -> TemplateResult<String> {
        if parameters.is_empty() {
            Ok(format!("<{}>", name))
        } else {
            Ok(format!("<{}({})>", name, parameters.join(",")))
        }
    }

    fn parse(text: &str) -> String {
        SyntaxParser::default().parse(text, &echo).unwrap()
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        assert_eq!(parse("https://example.com/upload.php"), "https://example.com/upload.php");
        assert_eq!(parse("plain text, with: colons"), "plain text, with: colons");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), "");
    }

    #[test]
    fn test_function_without_parameters() {
        assert_eq!(parse("{response}"), "<response>");
        assert_eq!(parse("a{filename}b"), "a<filename>b");
    }

    #[test]
    fn test_parameter_splitting() {
        assert_eq!(parse("{fn:a|b|c}"), "<fn(a,b,c)>");
        assert_eq!(parse("x{json:data.link}y"), "x<json(data.link)>y");
    }

    #[test]
    fn test_empty_parameters_are_kept() {
        let seen = RefCell::new(Vec::new());
        let caller = |name: &str, parameters: &[String]| -> TemplateResult<String> {
            seen.borrow_mut().push((name.to_string(), parameters.to_vec()));
            Ok(String::new())
        };
        SyntaxParser::default().parse("{fn:|}", &caller).unwrap();
        assert_eq!(
            seen.into_inner(),
            vec![("fn".to_string(), vec![String::new(), String::new()])]
        );
    }

    #[test]
    fn test_nested_function_in_parameter_resolves_first() {
        let order = RefCell::new(Vec::new());
        let caller = |name: &str, parameters: &[String]| -> TemplateResult<String> {
            order.borrow_mut().push(name.to_string());
            Ok(format!("[{}{}]", name, parameters.join("|")))
        };
        let output = SyntaxParser::default().parse("{outer:{inner}}", &caller).unwrap();
        assert_eq!(output, "[outer[inner]]");
        assert_eq!(order.into_inner(), vec!["inner", "outer"]);
    }

    #[test]
    fn test_nested_function_in_name() {
        let caller = |name: &str, _: &[String]| -> TemplateResult<String> {
            match name {
                "kind" => Ok("json".to_string()),
                other => Ok(format!("called {}", other)),
            }
        };
        let output = SyntaxParser::default().parse("{{kind}}", &caller).unwrap();
        assert_eq!(output, "called json");
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        let caller = |_: &str, _: &[String]| -> TemplateResult<String> {
            panic!("no function should be dispatched")
        };
        let output = SyntaxParser::default().parse("\\{literal\\}", &caller).unwrap();
        assert_eq!(output, "{literal}");
    }

    #[test]
    fn test_escape_applies_to_one_character() {
        assert_eq!(parse("\\\\{x}"), "\\<x>");
        assert_eq!(parse("a\\|b"), "a|b");
        assert_eq!(parse("{fn:a\\|b}"), "<fn(a|b)>");
        assert_eq!(parse("{fn:a\\}b}"), "<fn(a}b)>");
    }

    #[test]
    fn test_trailing_escape_is_dropped() {
        assert_eq!(parse("abc\\"), "abc");
    }

    #[test]
    fn test_unterminated_parameter_list() {
        assert_eq!(parse("{fn:a"), "<fn(a)>");
        assert_eq!(parse("{fn:a|b"), "<fn(a,b)>");
    }

    #[test]
    fn test_unterminated_function() {
        assert_eq!(parse("abc{fn"), "abc<fn>");
    }

    #[test]
    fn test_top_level_terminators_stop_parsing() {
        assert_eq!(parse("left}right"), "left");
        assert_eq!(parse("left|right"), "left");
    }

    #[test]
    fn test_function_stopped_by_delimiter_skips_it() {
        assert_eq!(parse("{a|b}c"), "<a>b");
    }

    #[test]
    fn test_parameter_start_outside_function_is_literal() {
        assert_eq!(parse("time: {fn:x}"), "time: <fn(x)>");
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(parse("héllo {fn:wörld}"), "héllo <fn(wörld)>");
    }

    #[test]
    fn test_caller_errors_propagate() {
        let caller = |name: &str, _: &[String]| -> TemplateResult<String> {
            Err(TemplateError::InvalidFunctionName(name.to_string()))
        };
        let result = SyntaxParser::default().parse("ok {missing}", &caller);
        assert!(matches!(result, Err(TemplateError::InvalidFunctionName(name)) if name == "missing"));
    }

    #[test]
    fn test_custom_syntax() {
        let syntax = Syntax::new('<', '>', '=', ',', '^').unwrap();
        let output = SyntaxParser::new(syntax).parse("a<fn=x,y>^<b", &echo).unwrap();
        assert_eq!(output, "a<fn(x,y)><b");
    }

    #[test]
    fn test_syntax_characters_must_be_distinct() {
        let result = Syntax::new('{', '}', ':', ':', '\\');
        assert!(matches!(result, Err(TemplateError::InvalidSyntax(_))));
    }

    #[test]
    fn test_escape_text_round_trips() {
        let syntax = Syntax::default();
        let raw = "^(https?://\\S+)|{x}:y$";
        let escaped = syntax.escape_text(raw);
        assert_eq!(parse(&escaped), raw);
    }
}
