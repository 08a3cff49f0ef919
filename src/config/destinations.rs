// Loading and saving destination files

use anyhow::{bail, Context, Result};
use std::path::Path;

use super::serializers::{DestinationSerializer, SxcuSerializer, YamlSerializer};
use crate::domain::uploader::CustomUploaderItem;

/// `.yml`/`.yaml` files are YAML lists; anything else is read as `.sxcu` JSON
pub fn serializer_for(path: &Path) -> Box<dyn DestinationSerializer> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
            Box::new(YamlSerializer)
        }
        _ => Box::new(SxcuSerializer),
    }
}

/// Read every destination in a file. Items are returned as written; callers
/// decide whether to migrate them.
pub fn load_destinations(path: &Path) -> Result<Vec<CustomUploaderItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read destination file {}", path.display()))?;
    serializer_for(path)
        .deserialize(&content)
        .with_context(|| format!("Invalid destination file {}", path.display()))
}

pub fn save_destinations(path: &Path, items: &[CustomUploaderItem]) -> Result<()> {
    let content = serializer_for(path).serialize(items)?;
    std::fs::write(path, content)
        .with_context(|| format!("Could not write destination file {}", path.display()))
}

/// Pick a destination by name (case-insensitive), or the only one in the file
pub fn select_destination(
    items: Vec<CustomUploaderItem>,
    name: Option<&str>,
) -> Result<CustomUploaderItem> {
    match name {
        Some(name) => items
            .into_iter()
            .find(|item| item.name.eq_ignore_ascii_case(name))
            .with_context(|| format!("No destination named \"{}\"", name)),
        None => {
            let mut items = items.into_iter();
            match (items.next(), items.next()) {
                (Some(item), None) => Ok(item),
                (None, _) => bail!("Destination file is empty"),
                (Some(_), Some(_)) => bail!("Destination file holds several destinations, pick one by name"),
            }
        }
    }
}
