use serde::{Deserialize, Serialize};

use std::future::Future;
use std::path::Path;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Classes applied to inline `code` spans so they read differently from block code.
pub const DEFAULT_INLINE_CODE_CLASSES: &[&str] = &[
    "!bg-transparent",
    "!text-red-500",
    "dark:!text-red-400",
    "font-mono",
    "text-sm",
    "font-medium",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Read path: sanitizing, highlighting and outline settings.
    pub renderer: RendererConfig,
    /// Write path: editor history and emitted markup.
    pub editor: EditorConfig,
    /// Where attached images go.
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Class list added to every inline code span.
    pub inline_code_classes: Vec<String>,
    /// Run syntax highlighting over fenced code blocks.
    pub highlight_code: bool,
    pub toc: TocConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            inline_code_classes: DEFAULT_INLINE_CODE_CLASSES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            highlight_code: true,
            toc: TocConfig::default(),
        }
    }
}

/// Geometry of the band a heading has to enter to become the active one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    /// Pixels excluded at the top of the viewport.
    pub top_margin_px: f64,
    /// Fraction of the viewport height excluded at the bottom.
    pub bottom_fraction: f64,
    /// Prefix for generated heading ids.
    pub id_prefix: String,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            top_margin_px: 100.0,
            bottom_fraction: 0.66,
            id_prefix: "heading-".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo history depth.
    pub max_undo_steps: usize,
    /// Class attribute emitted on links.
    pub link_class: String,
    /// Class attribute emitted on images.
    pub image_class: String,
    /// `target` emitted on links, if any.
    pub link_target: Option<String>,
    /// `rel` emitted on links, if any.
    pub link_rel: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_steps: 100,
            link_class: "underline underline-offset-4".to_owned(),
            image_class: "rounded-lg border border-border max-w-full".to_owned(),
            link_target: Some("_blank".to_owned()),
            link_rel: Some("noopener noreferrer nofollow".to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket attached images are uploaded into.
    pub bucket: String,
    /// Base URL public object URLs are built from.
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "images".to_owned(),
            public_base_url: "http://localhost:54321/storage/v1/object/public".to_owned(),
        }
    }
}

impl StorageConfig {
    /// Public URL of an object in the configured bucket.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}

impl Config {
    /// Loads the configuration from the provided loader.
    pub async fn load(loader: &impl Loader) -> Result<Self, ConfigError> {
        loader.load().await
    }
    /// Saves the configuration using the provided saver.
    pub async fn save(&self, saver: &impl Saver) -> Result<(), ConfigError> {
        saver.save(self).await
    }
}

/// The trait for loading configuration data.
pub trait Loader {
    /// Loads the configuration data.
    fn load(&self) -> impl Future<Output = Result<Config, ConfigError>> + Send;
}

/// The trait for saving configuration data.
pub trait Saver {
    /// Saves the configuration data.
    fn save(&self, config: &Config) -> impl Future<Output = Result<(), ConfigError>> + Send;
}

/// An implementation of [`Loader`] and [`Saver`] that reads and writes a configuration file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a new [`FileStore`] with the given path.
    ///
    /// [`Config`] data is serialized according to the file extension,
    /// `.json` and `.toml` are supported.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn format(&self) -> Result<Format, ConfigError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            other => Err(ConfigError::UnsupportedFormat {
                extension: other.map(str::to_owned),
            }),
        }
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

enum Format {
    Json,
    Toml,
}

impl Loader for FileStore {
    async fn load(&self) -> Result<Config, ConfigError> {
        let format = self.format()?;
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        let config = match format {
            Format::Json => serde_json::from_str(&text)?,
            Format::Toml => toml::from_str(&text)?,
        };
        tracing::debug!(path = %self.path.display(), "loaded config");
        Ok(config)
    }
}

impl Saver for FileStore {
    async fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let text = match self.format()? {
            Format::Json => serde_json::to_string_pretty(config)?,
            Format::Toml => toml::to_string_pretty(config)?,
        };
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| self.io_error(e))
    }
}
