// Template function trait, registry, and the built-in functions

use anyhow::{anyhow, Context, Result};
use rand::Rng;
use regex::Regex;
use std::collections::HashMap;

use super::context::{ParseContext, ResponseInfo};
use super::json_path;

/// A named function callable from templates as `{name:param|param}`
pub trait TemplateFunction: Send + Sync {
    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn min_parameter_count(&self) -> usize {
        0
    }

    fn call(&self, context: &ParseContext<'_>, parameters: &[String]) -> Result<String>;
}

fn require_response<'a>(context: &ParseContext<'a>) -> Result<&'a ResponseInfo> {
    context
        .response
        .ok_or_else(|| anyhow!("response is only available when parsing a response"))
}

/// Response body
pub struct ResponseFunction;

impl TemplateFunction for ResponseFunction {
    fn name(&self) -> &'static str {
        "response"
    }

    fn call(&self, context: &ParseContext<'_>, _parameters: &[String]) -> Result<String> {
        Ok(require_response(context)?.body.clone())
    }
}

/// Final URL of the response, after redirects
pub struct ResponseUrlFunction;

impl TemplateFunction for ResponseUrlFunction {
    fn name(&self) -> &'static str {
        "responseurl"
    }

    fn call(&self, context: &ParseContext<'_>, _parameters: &[String]) -> Result<String> {
        Ok(require_response(context)?.response_url.clone())
    }
}

/// Response header value
pub struct HeaderFunction;

impl TemplateFunction for HeaderFunction {
    fn name(&self) -> &'static str {
        "header"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["headers"]
    }

    fn min_parameter_count(&self) -> usize {
        1
    }

    fn call(&self, context: &ParseContext<'_>, parameters: &[String]) -> Result<String> {
        let response = require_response(context)?;
        Ok(response.header(&parameters[0]).unwrap_or_default())
    }
}

/// JSON path lookup: `{json:path}` on the response body or `{json:input|path}`
pub struct JsonFunction;

impl TemplateFunction for JsonFunction {
    fn name(&self) -> &'static str {
        "json"
    }

    fn min_parameter_count(&self) -> usize {
        1
    }

    fn call(&self, context: &ParseContext<'_>, parameters: &[String]) -> Result<String> {
        let (input, path) = match parameters {
            [input, path, ..] => (input.as_str(), path.as_str()),
            [path] => (require_response(context)?.body.as_str(), path.as_str()),
            [] => return Err(anyhow!("a JSON path is required")),
        };

        let document: serde_json::Value =
            serde_json::from_str(input).context("input is not valid JSON")?;
        let selected = json_path::select(&document, path)?;
        Ok(json_path::value_to_string(selected))
    }
}

/// Regex match over the response body: `{regex:pattern}` or `{regex:pattern|group}`
pub struct RegexFunction;

impl TemplateFunction for RegexFunction {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn min_parameter_count(&self) -> usize {
        1
    }

    fn call(&self, context: &ParseContext<'_>, parameters: &[String]) -> Result<String> {
        let response = require_response(context)?;
        let pattern = Regex::new(&parameters[0])
            .with_context(|| format!("invalid regular expression \"{}\"", parameters[0]))?;

        let Some(captures) = pattern.captures(&response.body) else {
            return Ok(String::new());
        };

        let group = match parameters.get(1).map(|g| g.trim()) {
            None | Some("") => captures.get(0),
            Some(group) => match group.parse::<usize>() {
                Ok(index) => captures.get(index),
                Err(_) => captures.name(group),
            },
        };

        Ok(group.map(|m| m.as_str().to_string()).unwrap_or_default())
    }
}

/// Name of the file being uploaded
pub struct FileNameFunction;

impl TemplateFunction for FileNameFunction {
    fn name(&self) -> &'static str {
        "filename"
    }

    fn call(&self, context: &ParseContext<'_>, _parameters: &[String]) -> Result<String> {
        Ok(context.file_name.unwrap_or_default().to_string())
    }
}

/// Raw text being shared (e.g. the URL being shortened)
pub struct InputFunction;

impl TemplateFunction for InputFunction {
    fn name(&self) -> &'static str {
        "input"
    }

    fn call(&self, context: &ParseContext<'_>, _parameters: &[String]) -> Result<String> {
        Ok(context.input.unwrap_or_default().to_string())
    }
}

/// One of the parameters, picked at random
pub struct RandomFunction;

impl TemplateFunction for RandomFunction {
    fn name(&self) -> &'static str {
        "random"
    }

    fn min_parameter_count(&self) -> usize {
        1
    }

    fn call(&self, _context: &ParseContext<'_>, parameters: &[String]) -> Result<String> {
        let index = rand::rng().random_range(0..parameters.len());
        Ok(parameters[index].clone())
    }
}

/// Registry of template functions, keyed by lowercase name and alias
pub struct FunctionRegistry {
    functions: Vec<Box<dyn TemplateFunction>>,
    by_name: HashMap<String, usize>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(ResponseFunction));
        registry.register(Box::new(ResponseUrlFunction));
        registry.register(Box::new(HeaderFunction));
        registry.register(Box::new(JsonFunction));
        registry.register(Box::new(RegexFunction));
        registry.register(Box::new(FileNameFunction));
        registry.register(Box::new(InputFunction));
        registry.register(Box::new(RandomFunction));
        registry
    }

    pub fn empty() -> Self {
        Self {
            functions: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Later registrations win over earlier ones for a clashing name or alias
    pub fn register(&mut self, function: Box<dyn TemplateFunction>) {
        let index = self.functions.len();
        self.by_name.insert(function.name().to_lowercase(), index);
        for alias in function.aliases() {
            self.by_name.insert(alias.to_lowercase(), index);
        }
        self.functions.push(function);
    }

    pub fn get(&self, name: &str) -> Option<&dyn TemplateFunction> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| self.functions[index].as_ref())
    }

    /// Primary names of every registered function
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.functions.iter().map(|f| f.name()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
