// ABOUTME: Project scaffolding for hyperslide
// ABOUTME: Creates a new presentation directory with layouts, a theme and starter slides

use crate::config::DEFAULT_SLIDES_FILE;
use crate::errors::{Result, SlideError};
use crate::layout::{builtin_layouts, LAYOUTS_DIR, LAYOUT_EXTENSION};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

const THEME_CSS: &str = include_str!("../assets/theme.css");
const STARTER_SLIDES: &str = include_str!("../assets/starter.md");

/// Create `<parent>/<name>` and populate it. Fails if it already exists.
pub fn init_project(parent: &Path, name: &str) -> Result<PathBuf> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SlideError::ValidationError("Project name is empty".into()));
    }

    let dir = parent.join(name);
    if dir.exists() {
        return Err(SlideError::ValidationError(format!(
            "Directory {:?} already exists",
            dir
        )));
    }

    let layouts = dir.join(LAYOUTS_DIR);
    let styles = dir.join("styles");
    fs::create_dir_all(&layouts)?;
    fs::create_dir_all(&styles)?;

    for (layout, template) in builtin_layouts() {
        fs::write(layouts.join(format!("{}.{}", layout, LAYOUT_EXTENSION)), template)?;
    }
    fs::write(styles.join("theme.css"), THEME_CSS)?;
    fs::write(dir.join(DEFAULT_SLIDES_FILE), STARTER_SLIDES)?;

    info!("Initialized project in {:?}", dir);
    Ok(dir)
}
