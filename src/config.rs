use crate::errors::Result;
use crate::replacer::OutputPolicy;
use crate::report::ReportFormat;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The file name looked up in the working directory when no `--config` is given.
pub const LOCAL_CONFIG_NAME: &str = ".rewriter.yaml";

/// Defaults read from a YAML configuration file.
///
/// ```yaml
/// types: [".md", ".rst"]
/// dictionaries: [dict.json]
/// lowercase: false
/// report: text
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Extra suffixes accepted in directory mode, on top of `.txt`.
    #[serde(default)]
    pub types: Vec<String>,
    /// Dictionaries loaded before any given on the command line. Relative
    /// paths are resolved against the directory holding the config file.
    #[serde(default)]
    pub dictionaries: Vec<PathBuf>,
    /// Lower-case input before applying rules.
    #[serde(default)]
    pub lowercase: bool,
    /// The end-of-run report format.
    #[serde(default)]
    pub report: Option<ReportFormat>,
}

/// The immutable settings of one invocation, merged from the config file and
/// the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub changes: Vec<String>,
    pub dictionaries: Vec<PathBuf>,
    pub reverse: bool,
    pub lowercase: bool,
    pub policy: OutputPolicy,
    pub types: Vec<String>,
    pub report: ReportFormat,
}

/// A utility for locating and loading the configuration file.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds the configuration file to use.
    ///
    /// An explicit path must exist. Without one, the search order is:
    /// 1. `.rewriter.yaml` in `working_dir`.
    /// 2. `rewriter/config.yaml` in the user configuration directory.
    ///
    /// Returns `Ok(None)` when no implicit configuration exists.
    pub fn find_config(explicit: Option<&Path>, working_dir: &Path) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(format!("Config file '{}' not found", path.display()).into());
        }

        let local = working_dir.join(LOCAL_CONFIG_NAME);
        if local.is_file() {
            return Ok(Some(local));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user = config_dir.join("rewriter").join("config.yaml");
            if user.is_file() {
                return Ok(Some(user));
            }
        }

        Ok(None)
    }

    /// Loads a `FileConfig` from a YAML file.
    pub fn load(path: &Path) -> Result<FileConfig> {
        let file = File::open(path)?;
        let mut config: FileConfig = serde_yaml::from_reader(file)?;

        if let Some(base) = path.parent() {
            for dictionary in &mut config.dictionaries {
                if dictionary.is_relative() {
                    *dictionary = base.join(&*dictionary);
                }
            }
        }
        Ok(config)
    }
}
