// Template resolution against a function registry and a parse context

use tracing::debug;

use super::context::ParseContext;
use super::functions::FunctionRegistry;
use super::parser::{FunctionCaller, Syntax, SyntaxParser};
use crate::domain::naming::NameParser;
use crate::error::{TemplateError, TemplateResult};

/// How function output is encoded before it is inserted into the template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputEncoding {
    #[default]
    None,
    Url,
    Json,
    Xml,
}

impl OutputEncoding {
    pub fn apply(&self, text: &str) -> String {
        match self {
            OutputEncoding::None => text.to_string(),
            OutputEncoding::Url => urlencoding::encode(text).into_owned(),
            OutputEncoding::Json => json_escape(text),
            OutputEncoding::Xml => xml_escape(text),
        }
    }
}

/// Escape text for use inside a JSON string literal (without the quotes)
pub fn json_escape(text: &str) -> String {
    let quoted = serde_json::Value::String(text.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

pub fn xml_escape(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

/// Parses custom uploader templates, dispatching function calls to a registry
pub struct CustomUploaderParser<'a> {
    registry: &'a FunctionRegistry,
    context: ParseContext<'a>,
    parser: SyntaxParser,
    encoding: OutputEncoding,
}

impl<'a> CustomUploaderParser<'a> {
    pub fn new(registry: &'a FunctionRegistry, context: ParseContext<'a>) -> Self {
        Self {
            registry,
            context,
            parser: SyntaxParser::default(),
            encoding: OutputEncoding::None,
        }
    }

    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.parser = SyntaxParser::new(syntax);
        self
    }

    pub fn with_encoding(mut self, encoding: OutputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn parse(&self, text: &str) -> TemplateResult<String> {
        self.parser.parse(text, self)
    }

    /// Expand name tokens in the unescaped parts first, then parse
    pub fn parse_with_names(&self, text: &str, names: &mut NameParser) -> TemplateResult<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let text = names.parse_keeping_escapes(text, self.parser.syntax().escape)?;
        self.parse(&text)
    }
}

impl FunctionCaller for CustomUploaderParser<'_> {
    fn call_function(&self, name: &str, parameters: &[String]) -> TemplateResult<String> {
        let function = self
            .registry
            .get(name)
            .ok_or_else(|| TemplateError::InvalidFunctionName(name.to_string()))?;

        let minimum = function.min_parameter_count();
        if parameters.len() < minimum {
            return Err(TemplateError::MinimumParameterCount {
                function: function.name().to_string(),
                minimum,
                actual: parameters.len(),
            });
        }

        debug!(
            function = function.name(),
            parameters = parameters.len(),
            "Calling template function"
        );

        let output = function
            .call(&self.context, parameters)
            .map_err(|source| TemplateError::FunctionFailed {
                function: function.name().to_string(),
                source,
            })?;

        Ok(self.encoding.apply(&output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::{ResponseInfo, TemplateFunction};

    struct PairFunction;

    impl TemplateFunction for PairFunction {
        fn name(&self) -> &'static str {
            "pair"
        }

        fn aliases(&self) -> &'static [&'static str] {
            &["two"]
        }

        fn min_parameter_count(&self) -> usize {
            2
        }

        fn call(&self, _context: &ParseContext<'_>, parameters: &[String]) -> anyhow::Result<String> {
            Ok(parameters.join("+"))
        }
    }

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry.register(Box::new(PairFunction));
        registry
    }

    #[test]
    fn test_unknown_function_fails() {
        let registry = registry();
        let parser = CustomUploaderParser::new(&registry, ParseContext::default());
        let err = parser.parse("{nope}").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidFunctionName(ref name) if name == "nope"));
    }

    #[test]
    fn test_arity_is_enforced() {
        let registry = registry();
        let parser = CustomUploaderParser::new(&registry, ParseContext::default());
        let err = parser.parse("{pair:only-one}").unwrap_err();
        match err {
            TemplateError::MinimumParameterCount { function, minimum, actual } => {
                assert_eq!(function, "pair");
                assert_eq!(minimum, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("Expected arity error, got {}", other),
        }
    }

    #[test]
    fn test_zero_parameters_fail_arity() {
        let registry = registry();
        let parser = CustomUploaderParser::new(&registry, ParseContext::default());
        assert!(matches!(
            parser.parse("{pair}"),
            Err(TemplateError::MinimumParameterCount { actual: 0, .. })
        ));
    }

    #[test]
    fn test_alias_and_case_insensitive_dispatch() {
        let registry = registry();
        let parser = CustomUploaderParser::new(&registry, ParseContext::default());
        assert_eq!(parser.parse("{TWO:a|b}").unwrap(), "a+b");
    }

    #[test]
    fn test_function_output_is_not_reparsed() {
        let response = ResponseInfo::new(200, "{not:a|call}");
        let registry = registry();
        let parser = CustomUploaderParser::new(&registry, ParseContext::for_response(&response));
        assert_eq!(parser.parse("[{response}]").unwrap(), "[{not:a|call}]");
    }

    #[test]
    fn test_function_failures_are_wrapped() {
        let registry = registry();
        let parser = CustomUploaderParser::new(&registry, ParseContext::default());
        assert!(matches!(
            parser.parse("{header:Location}"),
            Err(TemplateError::FunctionFailed { ref function, .. }) if function == "header"
        ));
    }

    #[test]
    fn test_url_encoding_applies_to_function_output_only() {
        let registry = registry();
        let context = ParseContext::for_request(Some("my shot.png"), None);
        let parser = CustomUploaderParser::new(&registry, context).with_encoding(OutputEncoding::Url);
        assert_eq!(
            parser.parse("https://example.com/{filename}?x=1").unwrap(),
            "https://example.com/my%20shot.png?x=1"
        );
    }

    #[test]
    fn test_json_and_xml_escaping() {
        assert_eq!(json_escape("say \"hi\"\n"), "say \\\"hi\\\"\\n");
        assert_eq!(xml_escape("<a href='x'>&</a>"), "&lt;a href=&apos;x&apos;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_name_tokens_skip_escaped_text() {
        let registry = registry();
        let parser = CustomUploaderParser::new(&registry, ParseContext::default());
        let mut names = NameParser::default().with_auto_increment_number(4);
        let output = parser.parse_with_names("%i-\\%i-{pair:%i|x}", &mut names).unwrap();
        assert_eq!(output, "5-%i-5+x");
        assert_eq!(names.auto_increment_number, 5);
    }
}
