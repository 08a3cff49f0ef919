// Template module for custom uploader syntax
//
// This module provides parsing of `{function:param|param}` templates, the
// registry of functions they can call, and escape-aware substitution.

mod context;
mod escape;
mod functions;
pub mod json_path;
mod parser;
mod resolver;

pub use context::{ParseContext, ResponseInfo};
pub use escape::apply_keeping_escapes;
pub use functions::{FunctionRegistry, TemplateFunction};
pub use parser::{FunctionCaller, Syntax, SyntaxParser};
pub use resolver::{json_escape, xml_escape, CustomUploaderParser, OutputEncoding};
