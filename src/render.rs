// ABOUTME: Slide rendering for hyperslide presentations
// ABOUTME: Builds per-slide HTML fragments from Markdown, attributes and layout templates

use crate::attributes::{self, Attributes};
use crate::errors::{Result, SlideError};
use crate::layout::{self, LayoutRegistry, ResolvedLayout, DEFAULT_LAYOUT};
use crate::splitter;
use crate::transform::TransformPipeline;
use handlebars::{html_escape, Handlebars};
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Slide entrance/exit animation, selected by the `transition` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transition {
    #[default]
    Fade,
    Zoom,
    Convex,
    Slide,
}

impl Transition {
    /// Unknown names fall back to `Fade`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "zoom" => Self::Zoom,
            "convex" => Self::Convex,
            "slide" => Self::Slide,
            _ => Self::Fade,
        }
    }

    fn duration(&self) -> u32 {
        match self {
            Self::Convex => 700,
            _ => 500,
        }
    }

    /// (hidden, shown) utility classes on top of the opacity change.
    fn classes(&self) -> (&'static str, &'static str) {
        match self {
            Self::Fade => ("", ""),
            Self::Zoom => ("scale-90", "scale-100"),
            Self::Convex => ("scale-110", "scale-100"),
            Self::Slide => ("translate-x-full", "translate-x-0"),
        }
    }

    /// Alpine.js `x-transition` attributes for entering and leaving.
    pub fn alpine_attributes(&self) -> String {
        let (hidden, shown) = self.classes();
        let hidden = format!("opacity-0 {}", hidden);
        let shown = format!("opacity-100 {}", shown);
        format!(
            "x-transition:enter=\"transition ease-out duration-{d}\" \
             x-transition:enter-start=\"{hidden}\" \
             x-transition:enter-end=\"{shown}\" \
             x-transition:leave=\"transition ease-in duration-300\" \
             x-transition:leave-start=\"{shown}\" \
             x-transition:leave-end=\"{hidden}\"",
            d = self.duration(),
            hidden = hidden.trim_end(),
            shown = shown.trim_end(),
        )
    }
}

/// Inline style derived from the `bg` attribute.
pub fn bg_style(attributes: &Attributes) -> String {
    match attributes.get("bg").map(|bg| bg.trim()) {
        None | Some("") => String::new(),
        Some(bg) if bg.starts_with("http") || bg.starts_with('/') || bg.starts_with('.') => format!(
            "background-image: url('{}'); background-size: cover; background-position: center;",
            bg
        ),
        Some(bg) => format!("background: {};", bg),
    }
}

/// Stylesheet link for the `theme` attribute, if any.
pub fn theme_link(attributes: &Attributes) -> Option<String> {
    let theme = attributes.get("theme")?.trim();
    if theme.is_empty() {
        return None;
    }
    let href = if theme.ends_with(".css") {
        theme.to_string()
    } else {
        format!("/styles/{}.css", theme)
    };
    Some(format!("<link rel=\"stylesheet\" href=\"{}\">", html_escape(&href)))
}

/// One rendered slide.
#[derive(Debug, Clone)]
pub struct Slide {
    pub index: usize,
    /// Main content Markdown, without the attribute comment and notes.
    pub markdown: String,
    pub attributes: Attributes,
    pub layout: ResolvedLayout,
    pub body_html: String,
    /// Empty when the slide has no notes.
    pub notes_html: String,
    /// The complete fragment served to viewers.
    pub markup: String,
}

/// A parsed and rendered slide deck.
#[derive(Debug, Clone)]
pub struct Presentation {
    pub source: PathBuf,
    pub attributes: Attributes,
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Document title from the `title` attribute, if present.
    pub fn title(&self) -> Option<&str> {
        self.attributes.get("title").map(String::as_str)
    }

    /// All slide fragments in index order.
    pub fn to_html(&self) -> String {
        self.slides
            .iter()
            .map(|slide| slide.markup.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Turns a Markdown source into slide fragments.
pub struct SlideRenderer {
    layouts: Arc<RwLock<LayoutRegistry>>,
    pipeline: TransformPipeline,
    templates: Handlebars<'static>,
}

impl SlideRenderer {
    pub fn new(layouts: Arc<RwLock<LayoutRegistry>>) -> Self {
        let mut templates = Handlebars::new();
        templates.set_strict_mode(true);
        Self {
            layouts,
            pipeline: TransformPipeline::standard(),
            templates,
        }
    }

    /// A renderer without project-local layouts.
    pub fn builtin() -> Self {
        Self::new(Arc::new(RwLock::new(LayoutRegistry::builtin_only())))
    }

    /// Parse and render the file at `path`.
    pub fn build(&self, path: &Path) -> Result<Presentation> {
        if !path.is_file() {
            return Err(SlideError::PathNotFoundError(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        Ok(self.build_from_str(path, &raw))
    }

    /// Render a document already in memory. Per-slide failures become
    /// diagnostics, so this never fails.
    pub fn build_from_str(&self, source: &Path, raw: &str) -> Presentation {
        let front_matter = attributes::parse_front_matter(raw);
        let global = front_matter.attributes;
        let chunks = splitter::split_slides(&front_matter.body, &global);

        let layouts = self.layouts.read();
        let slides: Vec<Slide> = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| self.render_slide(index, chunk, &global, &layouts))
            .collect();

        info!("Rendered {} slides from {:?}", slides.len(), source);
        Presentation {
            source: source.to_path_buf(),
            attributes: global,
            slides,
        }
    }

    /// All slide fragments for `path`. A missing or unreadable source yields a
    /// single diagnostic slide instead of an error.
    pub fn render_all(&self, path: &Path) -> String {
        match self.build(path) {
            Ok(presentation) => presentation.to_html(),
            Err(SlideError::PathNotFoundError(missing)) => {
                warn!("Slide source {:?} not found", missing);
                let name = missing
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| missing.display().to_string());
                diagnostic_slide(&format!(
                    "<div class=\"p-10 bg-red-900 text-white\">{} not found</div>",
                    html_escape(&name)
                ))
            }
            Err(e) => {
                error!("Failed to render {:?}: {}", path, e);
                diagnostic_slide(&format!(
                    "<div class=\"p-10 bg-red-900 text-white\">Could not read slides: {}</div>",
                    html_escape(&e.to_string())
                ))
            }
        }
    }

    fn render_slide(
        &self,
        index: usize,
        chunk: &str,
        global: &Attributes,
        layouts: &LayoutRegistry,
    ) -> Slide {
        let (local, content) = attributes::extract_local_attributes(chunk);
        let attributes = attributes::merge(global, local);
        let (markdown, notes) = splitter::split_notes(&content);

        let layout = layouts.resolve(&layout::layout_name(&attributes, &markdown));
        let body_html = self.pipeline.render_content(&markdown);
        let notes_html = notes
            .as_deref()
            .map(|notes| self.pipeline.render_notes(notes))
            .unwrap_or_default();

        let inner = match layout.load() {
            Ok(template) => {
                let context = template_context(&attributes, index, &body_html, &notes_html);
                match self.templates.render_template(&template, &context) {
                    Ok(html) => html,
                    Err(e) => {
                        warn!("Slide {}: render error in layout {}: {}", index, layout.origin(), e);
                        format!(
                            "<div class=\"p-10 text-red-500\">Render Error: {}</div>",
                            html_escape(&e.to_string())
                        )
                    }
                }
            }
            Err(e) => {
                warn!("Slide {}: {}", index, e);
                format!(
                    "<div class=\"p-10 border border-red-500 rounded text-red-500\">Layout Error: {}</div>",
                    html_escape(&layout.requested)
                )
            }
        };

        debug!("Slide {} uses layout {}", index, layout.origin());
        let markup = wrap_slide(index, &attributes, layout.name(), &inner, &notes_html);
        Slide {
            index,
            markdown,
            attributes,
            layout,
            body_html,
            notes_html,
            markup,
        }
    }
}

/// Template data: every attribute, then the fixed keys, which win.
fn template_context(attributes: &Attributes, index: usize, content: &str, notes: &str) -> Value {
    let mut context: Map<String, Value> = attributes
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();

    let text = |key: &str| attributes.get(key).cloned().unwrap_or_default();
    context.insert("content".into(), Value::String(content.to_string()));
    context.insert("notes".into(), Value::String(notes.to_string()));
    context.insert("index".into(), Value::from(index));
    context.insert("bgStyle".into(), Value::String(bg_style(attributes)));
    context.insert("style".into(), Value::String(text("style")));
    context.insert("class".into(), Value::String(text("class")));
    Value::Object(context)
}

fn wrap_slide(index: usize, attributes: &Attributes, layout: &str, inner: &str, notes: &str) -> String {
    let transition = attributes
        .get("transition")
        .map(|name| Transition::from_name(name))
        .unwrap_or_default();
    let style = attributes.get("style").map(|s| html_escape(s)).unwrap_or_default();
    let class = attributes.get("class").map(|c| html_escape(c)).unwrap_or_default();
    let theme = theme_link(attributes).unwrap_or_default();

    format!(
        "<div x-show=\"current === {index}\" style=\"{style}\" data-index=\"{index}\" data-layout=\"{layout}\" {transition} class=\"slide-content absolute inset-0 w-full h-full {class}\">\n\
         {theme}{inner}\n\
         <template class=\"speaker-notes\">{notes}</template>\n\
         </div>",
        index = index,
        style = style,
        layout = html_escape(layout),
        transition = transition.alpine_attributes(),
        class = class,
        theme = theme,
        inner = inner,
        notes = notes,
    )
}

/// A lone slide 0 carrying a diagnostic message.
fn diagnostic_slide(inner: &str) -> String {
    wrap_slide(0, &Attributes::new(), DEFAULT_LAYOUT, inner, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn build(raw: &str) -> Presentation {
        SlideRenderer::builtin().build_from_str(Path::new("slides.md"), raw)
    }

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_bg_style() {
        assert_eq!(bg_style(&Attributes::new()), "");
        assert_eq!(bg_style(&attrs(&[("bg", "#123")])), "background: #123;");
        assert_eq!(
            bg_style(&attrs(&[("bg", "/img/sky.jpg")])),
            "background-image: url('/img/sky.jpg'); background-size: cover; background-position: center;"
        );
        assert!(bg_style(&attrs(&[("bg", "https://x.test/a.png")])).starts_with("background-image"));
        assert!(bg_style(&attrs(&[("bg", "./a.png")])).starts_with("background-image"));
    }

    #[test]
    fn test_theme_link() {
        assert_eq!(theme_link(&Attributes::new()), None);
        assert_eq!(
            theme_link(&attrs(&[("theme", "dark")])).as_deref(),
            Some("<link rel=\"stylesheet\" href=\"/styles/dark.css\">")
        );
        assert_eq!(
            theme_link(&attrs(&[("theme", "https://cdn.test/t.css")])).as_deref(),
            Some("<link rel=\"stylesheet\" href=\"https://cdn.test/t.css\">")
        );
    }

    #[test]
    fn test_transitions() {
        assert_eq!(Transition::from_name("ZOOM"), Transition::Zoom);
        assert_eq!(Transition::from_name("wobble"), Transition::Fade);
        let zoom = Transition::Zoom.alpine_attributes();
        assert!(zoom.contains("x-transition:enter-start=\"opacity-0 scale-90\""));
        assert!(zoom.contains("x-transition:leave-end=\"opacity-0 scale-90\""));
        let fade = Transition::Fade.alpine_attributes();
        assert!(fade.contains("x-transition:enter-start=\"opacity-0\""));
        assert!(Transition::Convex.alpine_attributes().contains("duration-700"));
    }

    #[test]
    fn test_slide_wrapper() {
        let deck = build("# Hello\n\n---\n\nBody text\n???\nSay *hi*");
        assert_eq!(deck.slides.len(), 2);

        let first = &deck.slides[0];
        assert_eq!(first.layout.name(), "hero");
        assert!(first.markup.contains("x-show=\"current === 0\""));
        assert!(first.markup.contains("data-index=\"0\""));
        assert!(first.markup.contains("data-layout=\"hero\""));
        assert!(first.markup.contains("<h1>Hello</h1>"));
        assert!(first.markup.contains("<template class=\"speaker-notes\"></template>"));

        let second = &deck.slides[1];
        assert_eq!(second.notes_html, "<p>Say <em>hi</em></p>\n");
        assert!(second.markup.contains("<template class=\"speaker-notes\"><p>Say <em>hi</em></p>\n</template>"));
        assert!(!second.body_html.contains("Say"));
    }

    #[test]
    fn test_attributes_reach_wrapper() {
        let deck = build("<!--\nclass: centered\nstyle: color: red\ntransition: slide\ntheme: dark\nbg: #000\n-->\nText");
        let slide = &deck.slides[0];
        assert_eq!(slide.attributes.get("style").map(String::as_str), Some("color: red"));
        assert!(slide.markup.contains("class=\"slide-content absolute inset-0 w-full h-full centered\""));
        assert!(slide.markup.contains("style=\"color: red\""));
        assert!(slide.markup.contains("translate-x-full"));
        assert!(slide.markup.contains("href=\"/styles/dark.css\""));
        assert!(slide.markup.contains("style=\"background: #000;\""));
        assert!(!slide.markup.contains("<!--"));
    }

    #[test]
    fn test_global_attributes_inherited() {
        let deck = build("---\ntransition: zoom\n---\nOne\n\n---\n\n<!-- transition: fade -->\nTwo");
        assert_eq!(deck.attributes.get("transition").map(String::as_str), Some("zoom"));
        assert!(deck.slides[0].markup.contains("scale-90"));
        assert!(!deck.slides[1].markup.contains("scale-90"));
    }

    #[test]
    fn test_custom_attribute_in_template() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join(layout::LAYOUTS_DIR);
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("titled.hbs"), "<h6>{{kicker}}</h6>{{{content}}}").unwrap();

        let registry = Arc::new(RwLock::new(LayoutRegistry::scan(root.path())));
        let renderer = SlideRenderer::new(registry);
        let deck = renderer.build_from_str(
            Path::new("slides.md"),
            "<!--\nlayout: titled\nkicker: <Part 1>\n-->\nBody",
        );
        let slide = &deck.slides[0];
        assert!(matches!(slide.layout.source, layout::LayoutSource::Local(_)));
        assert!(slide.markup.contains("<h6>&lt;Part 1&gt;</h6>"));
    }

    #[test]
    fn test_strict_template_error_is_contained() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join(layout::LAYOUTS_DIR);
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("broken.hbs"), "{{missing_value}}").unwrap();

        let renderer = SlideRenderer::new(Arc::new(RwLock::new(LayoutRegistry::scan(root.path()))));
        let deck = renderer.build_from_str(
            Path::new("slides.md"),
            "<!-- layout: broken -->\nA\n\n---\n\nB",
        );
        assert_eq!(deck.slides.len(), 2);
        assert!(deck.slides[0].markup.contains("Render Error"));
        assert!(deck.slides[0].markup.contains("data-index=\"0\""));
        assert!(deck.slides[1].markup.contains("<p>B</p>"));
    }

    #[test]
    fn test_unreadable_layout_is_contained() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join(layout::LAYOUTS_DIR);
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("gone.hbs"), "{{{content}}}").unwrap();
        let renderer = SlideRenderer::new(Arc::new(RwLock::new(LayoutRegistry::scan(root.path()))));
        fs::remove_file(dir.join("gone.hbs")).unwrap();

        let deck = renderer.build_from_str(Path::new("slides.md"), "<!-- layout: gone -->\nA");
        assert!(deck.slides[0].markup.contains("Layout Error: gone"));
    }

    #[test]
    fn test_render_all_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "# One\n\n---\n\n# Two\n").unwrap();
        let html = SlideRenderer::builtin().render_all(file.path());
        assert!(html.contains("data-index=\"0\""));
        assert!(html.contains("data-index=\"1\""));
        assert!(html.find("<h1>One</h1>").unwrap() < html.find("<h1>Two</h1>").unwrap());
    }

    #[test]
    fn test_missing_source_is_a_diagnostic_slide() {
        let dir = TempDir::new().unwrap();
        let html = SlideRenderer::builtin().render_all(&dir.path().join("slides.md"));
        assert!(html.contains("slides.md not found"));
        assert!(html.contains("data-index=\"0\""));
        assert!(matches!(
            SlideRenderer::builtin().build(&dir.path().join("slides.md")),
            Err(SlideError::PathNotFoundError(_))
        ));
    }
}
