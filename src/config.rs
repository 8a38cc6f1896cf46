// ABOUTME: Configuration module for the hyperslide application
// ABOUTME: Provides defaults and environment variable handling for serving and exporting

use crate::errors::{Result, SlideError};
use crate::resources::ResourceFile;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_SLIDES_FILE: &str = "slides.md";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_EXPORT_DIR: &str = "dist";

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    /// Project directory: layouts, styles and static files live here
    pub root: PathBuf,
    /// Slide source, relative to `root` unless absolute
    pub slides_file: PathBuf,
    pub host: String,
    pub port: u16,
    pub debounce_ms: u64,
    /// Extra stylesheets linked into the shell page
    pub css_files: Vec<ResourceFile>,
    /// Extra scripts linked into the shell page
    pub js_files: Vec<ResourceFile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            slides_file: PathBuf::from(DEFAULT_SLIDES_FILE),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            css_files: Vec::new(),
            js_files: Vec::new(),
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let root = env::var("HYPERSLIDE_ROOT")
            .ok()
            .map(PathBuf::from)
            .unwrap_or(defaults.root);
        let slides_file = env::var("HYPERSLIDE_FILE")
            .ok()
            .map(PathBuf::from)
            .unwrap_or(defaults.slides_file);
        let host = env::var("HYPERSLIDE_HOST").unwrap_or(defaults.host);
        let port = env::var("HYPERSLIDE_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let debounce_ms = env::var("HYPERSLIDE_DEBOUNCE_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.debounce_ms);

        Self {
            root,
            slides_file,
            host,
            port,
            debounce_ms,
            ..defaults
        }
    }

    /// Absolute path of the slide source
    pub fn slides_path(&self) -> PathBuf {
        if self.slides_file.is_absolute() {
            self.slides_file.clone()
        } else {
            self.root.join(&self.slides_file)
        }
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| SlideError::ConfigError(format!("Invalid address {}:{}: {}", self.host, self.port, e)))
    }
}
