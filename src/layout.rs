// ABOUTME: Layout resolution for hyperslide slides
// ABOUTME: Infers layout names and maps them to project-local or built-in templates

use crate::attributes::Attributes;
use crate::errors::{SlideError, Result};
use crate::splitter::{heading_level, FenceTracker};
use log::{debug, info, warn};
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DEFAULT_LAYOUT: &str = "default";
pub const LAYOUT_EXTENSION: &str = "hbs";
pub const LAYOUTS_DIR: &str = "layouts";

const BUILTIN_LAYOUTS: &[(&str, &str)] = &[
    ("default", include_str!("../layouts/default.hbs")),
    ("hero", include_str!("../layouts/hero.hbs")),
    ("split", include_str!("../layouts/split.hbs")),
];

/// Built-in layouts shipped with the binary, as `(name, template)` pairs.
pub fn builtin_layouts() -> &'static [(&'static str, &'static str)] {
    BUILTIN_LAYOUTS
}

fn builtin_layout(name: &str) -> Option<(&'static str, &'static str)> {
    BUILTIN_LAYOUTS.iter().copied().find(|(n, _)| *n == name)
}

/// Where a resolved layout's template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSource {
    /// A project override under `layouts/`.
    Local(PathBuf),
    /// A built-in layout matching the requested name.
    BuiltIn(&'static str),
    /// Nothing matched; the built-in default serves it.
    Fallback,
}

/// The outcome of resolving one layout name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayout {
    pub requested: String,
    pub source: LayoutSource,
}

impl ResolvedLayout {
    /// Name of the layout that actually serves the slide.
    pub fn name(&self) -> &str {
        match &self.source {
            LayoutSource::Local(_) => &self.requested,
            LayoutSource::BuiltIn(name) => name,
            LayoutSource::Fallback => DEFAULT_LAYOUT,
        }
    }

    /// Human readable origin, for logs and diagnostics.
    pub fn origin(&self) -> String {
        match &self.source {
            LayoutSource::Local(path) => path.display().to_string(),
            LayoutSource::BuiltIn(name) => format!("built-in:{}", name),
            LayoutSource::Fallback => format!("built-in:{} (fallback)", DEFAULT_LAYOUT),
        }
    }

    /// Read the template text.
    pub fn load(&self) -> Result<Cow<'static, str>> {
        match &self.source {
            LayoutSource::Local(path) => fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|e| {
                    SlideError::LayoutError(format!(
                        "Could not read layout {:?}: {}",
                        path, e
                    ))
                }),
            LayoutSource::BuiltIn(name) => builtin_layout(name)
                .map(|(_, template)| Cow::Borrowed(template))
                .ok_or_else(|| SlideError::LayoutError(format!("Unknown built-in layout: {}", name))),
            LayoutSource::Fallback => Ok(Cow::Borrowed(default_template())),
        }
    }
}

fn default_template() -> &'static str {
    BUILTIN_LAYOUTS[0].1
}

/// Name → template lookup table, filled by scanning the project once.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    dir: Option<PathBuf>,
    local: HashMap<String, PathBuf>,
}

impl LayoutRegistry {
    /// A registry that only knows the built-in layouts.
    pub fn builtin_only() -> Self {
        Self::default()
    }

    /// Build a registry from `<root>/layouts/*.hbs`.
    pub fn scan(root: &Path) -> Self {
        let mut registry = Self {
            dir: Some(root.join(LAYOUTS_DIR)),
            local: HashMap::new(),
        };
        registry.rescan();
        registry
    }

    /// Re-read the project layouts directory.
    pub fn rescan(&mut self) {
        self.local.clear();
        let Some(dir) = &self.dir else {
            return;
        };
        if !dir.is_dir() {
            debug!("No project layouts directory at {:?}", dir);
            return;
        }

        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            LAYOUT_EXTENSION
        );
        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Invalid layout pattern {}: {}", pattern, e);
                return;
            }
        };

        for path in entries.filter_map(|entry| entry.ok()) {
            if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                self.local.insert(name.to_string(), path.clone());
            }
        }
        info!("Registered {} project layouts from {:?}", self.local.len(), dir);
    }

    /// Whether `path` lives in the directory this registry scans.
    pub fn watches(&self, path: &Path) -> bool {
        self.dir.as_deref().is_some_and(|dir| path.starts_with(dir))
    }

    /// Names of the project-local layouts, sorted.
    pub fn local_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.local.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a layout name: project-local, then built-in, then default.
    pub fn resolve(&self, name: &str) -> ResolvedLayout {
        let source = if let Some(path) = self.local.get(name) {
            LayoutSource::Local(path.clone())
        } else if let Some((builtin, _)) = builtin_layout(name) {
            LayoutSource::BuiltIn(builtin)
        } else {
            LayoutSource::Fallback
        };

        let resolved = ResolvedLayout {
            requested: name.to_string(),
            source,
        };
        debug!("Layout '{}' served by {}", name, resolved.origin());
        resolved
    }
}

fn image_pattern() -> Option<&'static Regex> {
    static IMAGE: OnceLock<Option<Regex>> = OnceLock::new();
    IMAGE
        .get_or_init(|| {
            Regex::new(r"!\[[^\]]*\]\([^)]*\)|<img\s")
                .map_err(|e| warn!("Image pattern failed to compile: {}", e))
                .ok()
        })
        .as_ref()
}

/// Guess a layout from the shape of a slide's Markdown.
pub fn infer_layout(markdown: &str) -> &'static str {
    let mut fences = FenceTracker::default();
    let (mut h1, mut h2, mut non_blank) = (0usize, 0usize, 0usize);
    let mut has_image = false;

    for line in markdown.lines() {
        if !line.trim().is_empty() {
            non_blank += 1;
        }
        if fences.observe(line) {
            continue;
        }
        match heading_level(line) {
            Some(1) => h1 += 1,
            Some(2) => h2 += 1,
            _ => {}
        }
        has_image |= image_pattern().is_some_and(|image| image.is_match(line));
    }

    if h1 == 1 && h2 == 0 && !has_image && non_blank < 5 {
        "hero"
    } else if has_image && (h1 > 0 || h2 > 0) {
        "split"
    } else {
        DEFAULT_LAYOUT
    }
}

/// The layout a slide asks for: its `layout` attribute, else the inferred one.
pub fn layout_name(attributes: &Attributes, markdown: &str) -> String {
    attributes
        .get("layout")
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| infer_layout(markdown).to_string())
}
