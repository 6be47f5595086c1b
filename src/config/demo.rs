use crate::pipeline::PipelineOptions;
use crate::repository::SubjectDetails;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Default, Deserialize)]
pub struct OutputConfig {
    pub json_out: Option<PathBuf>,
    pub debug_dir: Option<PathBuf>,
}

/// Configuration of the file-driven enrollment demo.
#[derive(Clone, Deserialize)]
pub struct EnrollConfig {
    /// Eye images of the same subject, one burst stand-in each.
    pub images: Vec<PathBuf>,
    /// JSON record store to insert into.
    pub store_path: PathBuf,
    pub subject: SubjectDetails,
    #[serde(default)]
    pub pipeline: PipelineOptions,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Configuration of the verification demo.
#[derive(Clone, Deserialize)]
pub struct MatchConfig {
    /// Probe eye image.
    pub image: PathBuf,
    pub store_path: PathBuf,
    #[serde(default)]
    pub pipeline: PipelineOptions,
    #[serde(default)]
    pub output: OutputConfig,
}

pub fn load_enroll_config(path: &Path) -> Result<EnrollConfig, String> {
    load_config(path)
}

pub fn load_match_config(path: &Path) -> Result<MatchConfig, String> {
    load_config(path)
}

fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
