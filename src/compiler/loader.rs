use anyhow::{Result, Context as AnyhowContext};
use std::fs;
use std::path::Path;
use crate::dsl::Layout;

pub fn load_layout_from_yaml(file_path: impl AsRef<Path>) -> Result<Layout> {
    let file_path = file_path.as_ref();
    let yaml_content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read YAML file from {}", file_path.display()))?;

    let layout: Layout = serde_yaml::from_str(&yaml_content)
        .with_context(|| format!("Failed to deserialize YAML content from {}", file_path.display()))?;

    Ok(layout)
}

pub fn save_layout_to_yaml(layout: &Layout, file_path: impl AsRef<Path>) -> Result<()> {
    let file_path = file_path.as_ref();
    let yaml_content = serde_yaml::to_string(layout)
        .with_context(|| format!("Failed to serialize layout {}", layout.id))?;

    fs::write(file_path, yaml_content)
        .with_context(|| format!("Failed to write YAML file to {}", file_path.display()))?;

    Ok(())
}
