// Serializers for destination files

use anyhow::{Context, Result};

use crate::domain::uploader::CustomUploaderItem;

/// Strategy trait for destination file formats
pub trait DestinationSerializer: Send + Sync {
    fn serialize(&self, items: &[CustomUploaderItem]) -> Result<String>;
    fn deserialize(&self, content: &str) -> Result<Vec<CustomUploaderItem>>;
    fn file_extension(&self) -> &'static str;
}

/// ShareX `.sxcu` JSON: a single destination object, or an array of them
pub struct SxcuSerializer;

impl DestinationSerializer for SxcuSerializer {
    fn serialize(&self, items: &[CustomUploaderItem]) -> Result<String> {
        match items {
            [item] => Ok(serde_json::to_string_pretty(item)?),
            _ => Ok(serde_json::to_string_pretty(items)?),
        }
    }

    fn deserialize(&self, content: &str) -> Result<Vec<CustomUploaderItem>> {
        let value: serde_json::Value =
            serde_json::from_str(content).context("Destination file is not valid JSON")?;
        if value.is_array() {
            Ok(serde_json::from_value(value)?)
        } else {
            Ok(vec![serde_json::from_value(value)?])
        }
    }

    fn file_extension(&self) -> &'static str {
        "sxcu"
    }
}

/// YAML list of destinations
pub struct YamlSerializer;

impl DestinationSerializer for YamlSerializer {
    fn serialize(&self, items: &[CustomUploaderItem]) -> Result<String> {
        Ok(serde_yaml::to_string(items)?)
    }

    fn deserialize(&self, content: &str) -> Result<Vec<CustomUploaderItem>> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn file_extension(&self) -> &'static str {
        "yml"
    }
}
