// Naming module: `%token` substitution for generated names
//
// Unlike the template syntax, tokens are a flat find/replace over a fixed
// vocabulary (dates, counters, random characters, environment names).

pub mod codes;
mod helpers;
mod parser;

pub use helpers::{sanitize_file_name, sanitize_path, sanitize_url};
pub use parser::{NameParser, NameParserType};
