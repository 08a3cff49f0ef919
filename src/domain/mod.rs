// Domain layer: template interpretation, name generation and uploaders

pub mod naming;
pub mod template;
pub mod uploader;
