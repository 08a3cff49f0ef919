// Uploader module: destination items, their migration, and the compiler that
// turns them into requests and results

mod compiler;
mod item;
pub mod migration;
mod request;

pub use compiler::TemplateCompiler;
pub use item::{CustomUploaderBody, CustomUploaderItem, HttpMethod, LegacyResponseType};
pub use migration::{migrate, needs_migration, CURRENT_VERSION};
pub use request::{encode_pairs, RequestBody, RequestPieces, UploadResult};
