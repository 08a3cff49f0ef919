// Custom upload destinations: template interpretation, name generation,
// request compilation and the HTTP transport that sends the result

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod transport;

pub use domain::naming::{NameParser, NameParserType};
pub use domain::template::{
    CustomUploaderParser, FunctionRegistry, ParseContext, ResponseInfo, Syntax, SyntaxParser,
    TemplateFunction,
};
pub use domain::uploader::{migrate, CustomUploaderItem, TemplateCompiler, UploadResult};
pub use error::{TemplateError, TemplateResult};
