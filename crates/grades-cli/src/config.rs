//! Pipeline configuration assembly: data dir, then config file, then flags.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use grades_model::config::CONFIG_FILE_NAME;
use grades_model::{ConfigFile, PipelineConfig};

/// Build the pipeline configuration.
///
/// `data_dir` defaults to `$GRADEBOOK_DATA_DIR`, then `./data`. An explicit
/// `config_file` must exist; otherwise `gradebook.toml` in the data
/// directory is read when present.
pub fn load_config(data_dir: Option<&Path>, config_file: Option<&Path>) -> Result<PipelineConfig> {
    let data_dir = data_dir.map_or_else(PipelineConfig::default_data_dir, Path::to_path_buf);
    let mut config = PipelineConfig::from_data_dir(data_dir);

    let file_path = match config_file {
        Some(path) => Some(path.to_path_buf()),
        None => Some(config.data_dir.join(CONFIG_FILE_NAME)).filter(|path| path.is_file()),
    };
    if let Some(path) = file_path {
        let file = read_config_file(&path)?;
        config.apply(&file);
        tracing::debug!(path = %path.display(), "applied configuration file");
    }
    Ok(config)
}

/// Parse a `gradebook.toml` file.
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read configuration file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parse configuration file {}", path.display()))
}
