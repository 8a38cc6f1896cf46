// ABOUTME: Resource handling for the hyperslide application
// ABOUTME: Links or embeds extra local and remote CSS and JavaScript files

use crate::errors::{Result, SlideError};
use handlebars::html_escape;
use log::info;
use std::fs;
use std::path::Path;

/// Kind of tag a resource renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Css,
    Js,
}

/// Represents a resource file that can be either local or remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFile {
    pub path: String,
    pub is_remote: bool,
}

impl ResourceFile {
    /// Create a new ResourceFile from a path string.
    /// The path can be either a local file path or a URL.
    pub fn new(path: &str) -> Self {
        let is_remote = path.starts_with("http://") || path.starts_with("https://");
        Self {
            path: path.to_string(),
            is_remote,
        }
    }

    /// Read a local resource relative to `root`.
    fn read_local_content(&self, root: &Path) -> Result<String> {
        let path = root.join(&self.path);
        info!("Reading local resource: {:?}", path);
        if !path.exists() {
            return Err(SlideError::PathNotFoundError(path));
        }
        Ok(fs::read_to_string(&path)?)
    }

    /// URL the browser should request: remote as-is, local as a root-relative path.
    pub fn href(&self) -> String {
        if self.is_remote {
            self.path.clone()
        } else {
            format!("/{}", self.path.trim_start_matches("./").trim_start_matches('/'))
        }
    }

    /// A `<link>`/`<script src>` tag referencing the resource.
    pub fn link_tag(&self, kind: ResourceKind) -> String {
        let href = html_escape(&self.href());
        match kind {
            ResourceKind::Css => format!(r#"<link rel="stylesheet" href="{}">"#, href),
            ResourceKind::Js => format!(r#"<script src="{}"></script>"#, href),
        }
    }

    /// Generate the HTML tag for the resource. Local resources are inlined
    /// when `embed` is set; remote ones are always linked.
    pub fn tag(&self, kind: ResourceKind, embed: bool, root: &Path) -> Result<String> {
        if self.is_remote || !embed {
            return Ok(self.link_tag(kind));
        }

        let content = self.read_local_content(root)?;
        Ok(match kind {
            ResourceKind::Css => format!("<style>{}</style>", content),
            ResourceKind::Js => format!("<script>{}</script>", content),
        })
    }
}
