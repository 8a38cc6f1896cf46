// ABOUTME: Static export of a hyperslide presentation
// ABOUTME: Writes a standalone index.html with inlined slides and copies project assets

use crate::config::Config;
use crate::errors::Result;
use crate::layout::LayoutRegistry;
use crate::pages::{PageOptions, Pages, DEFAULT_TITLE};
use crate::render::SlideRenderer;
use crate::utils;
use log::info;
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub index: PathBuf,
    pub slides: usize,
    pub assets: usize,
}

/// Render the deck described by `config` into `output`.
///
/// A relative `output` is taken relative to the project root. Hidden
/// entries, the output directory itself and the slide source are not copied.
pub fn export_presentation(config: &Config, output: &Path) -> Result<ExportSummary> {
    let root = utils::get_absolute_path(&config.root)?;
    let slides_path = utils::absolute_path(&config.slides_path());
    utils::validate_file_exists(&slides_path)?;

    let output = if output.is_absolute() {
        output.to_path_buf()
    } else {
        root.join(output)
    };
    utils::validate_directory_writable(&output)?;
    let output = utils::get_absolute_path(&output)?;

    let layouts = Arc::new(RwLock::new(LayoutRegistry::scan(&root)));
    let presentation = SlideRenderer::new(layouts).build(&slides_path)?;
    let title = presentation.title().unwrap_or(DEFAULT_TITLE).to_string();

    let options = PageOptions {
        title: &title,
        root: &root,
        css: &config.css_files,
        js: &config.js_files,
    };
    let html = Pages::new()?.static_shell(&options, &presentation.to_html())?;
    let index = output.join("index.html");
    fs::write(&index, html)?;
    info!("Wrote {} slides to {:?}", presentation.slides.len(), index);

    let exclude = vec![output.clone(), slides_path.clone()];
    let assets = utils::copy_dir(&root, &output, &exclude)?;
    info!("Copied {} asset files into {:?}", assets, output);

    Ok(ExportSummary {
        index,
        slides: presentation.slides.len(),
        assets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SlideError;
    use tempfile::TempDir;

    #[test]
    fn test_export_writes_index_and_assets() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("slides.md"), "---\ntitle: Talk\n---\n# One\n\n---\n\n# Two").unwrap();
        fs::create_dir(root.join("img")).unwrap();
        fs::write(root.join("img").join("logo.png"), "png").unwrap();
        fs::write(root.join(".secret"), "x").unwrap();

        let config = Config {
            root: root.to_path_buf(),
            ..Config::default()
        };
        let summary = export_presentation(&config, Path::new("dist")).unwrap();

        assert_eq!(summary.slides, 2);
        assert_eq!(summary.assets, 1);
        let html = fs::read_to_string(&summary.index).unwrap();
        assert!(html.contains("<title>Talk</title>"));
        assert!(html.contains("data-live=\"false\""));
        assert!(html.contains("<h1>Two</h1>"));

        let dist = root.join("dist");
        assert!(dist.join("img").join("logo.png").exists());
        assert!(!dist.join("slides.md").exists());
        assert!(!dist.join(".secret").exists());
        assert!(!dist.join("dist").exists());
    }

    #[test]
    fn test_export_without_source_fails() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            root: dir.path().to_path_buf(),
            ..Config::default()
        };
        assert!(matches!(
            export_presentation(&config, Path::new("dist")),
            Err(SlideError::PathNotFoundError(_))
        ));
    }
}
