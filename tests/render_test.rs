use hyperslide::{LayoutRegistry, LayoutSource, SlideRenderer};
use parking_lot::RwLock;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn project_with_layouts(layouts: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let layouts_dir = dir.path().join("layouts");
    fs::create_dir_all(&layouts_dir).expect("Failed to create layouts dir");
    for (name, template) in layouts {
        fs::write(layouts_dir.join(format!("{}.hbs", name)), template)
            .expect("Failed to write layout");
    }
    dir
}

fn renderer_for(root: &Path) -> (SlideRenderer, Arc<RwLock<LayoutRegistry>>) {
    let layouts = Arc::new(RwLock::new(LayoutRegistry::scan(root)));
    (SlideRenderer::new(layouts.clone()), layouts)
}

#[test]
fn test_project_layout_receives_attributes() {
    let dir = project_with_layouts(&[(
        "quote",
        "<blockquote class=\"custom\" data-by=\"{{author}}\">{{{content}}}</blockquote>",
    )]);
    fs::write(
        dir.path().join("slides.md"),
        "---\nauthor: Ada\n---\n<!-- layout: quote -->\nTalk is cheap.",
    )
    .expect("Failed to write slides");

    let (renderer, _) = renderer_for(dir.path());
    let deck = renderer
        .build(&dir.path().join("slides.md"))
        .expect("Failed to build");
    let slide = &deck.slides[0];

    assert!(matches!(slide.layout.source, LayoutSource::Local(_)));
    assert!(slide.markup.contains("data-by=\"Ada\""));
    assert!(slide.markup.contains("<p>Talk is cheap.</p>"));
    assert!(slide.markup.contains("data-layout=\"quote\""));
}

#[test]
fn test_project_layout_overrides_builtin() {
    let dir = project_with_layouts(&[("default", "<main class=\"mine\">{{{content}}}</main>")]);
    let (renderer, _) = renderer_for(dir.path());

    let deck = renderer.build_from_str(Path::new("slides.md"), "Just text\n\nand more\n\nand more");
    let slide = &deck.slides[0];
    assert_eq!(slide.layout.name(), "default");
    assert!(matches!(slide.layout.source, LayoutSource::Local(_)));
    assert!(slide.markup.contains("<main class=\"mine\">"));
    assert!(!slide.markup.contains("layout-default"));
}

#[test]
fn test_strict_template_error_stays_on_its_slide() {
    let dir = project_with_layouts(&[("broken", "<div>{{doesNotExist}}</div>")]);
    let (renderer, _) = renderer_for(dir.path());

    let deck = renderer.build_from_str(
        Path::new("slides.md"),
        "<!-- layout: broken -->\nOne\n\n---\n\nTwo",
    );
    assert_eq!(deck.slides.len(), 2);
    assert!(deck.slides[0].markup.contains("Render Error"));
    assert!(deck.slides[0].markup.contains("data-index=\"0\""));
    assert!(!deck.slides[1].markup.contains("Render Error"));
    assert!(deck.slides[1].markup.contains("<p>Two</p>"));
}

#[test]
fn test_rescan_picks_up_new_layouts() {
    let dir = project_with_layouts(&[]);
    let (renderer, layouts) = renderer_for(dir.path());
    let source = "<!-- layout: fresh -->\nHello";

    let before = renderer.build_from_str(Path::new("slides.md"), source);
    assert_eq!(before.slides[0].layout.source, LayoutSource::Fallback);

    fs::write(
        dir.path().join("layouts").join("fresh.hbs"),
        "<div class=\"fresh\">{{{content}}}</div>",
    )
    .expect("Failed to write layout");
    layouts.write().rescan();

    let after = renderer.build_from_str(Path::new("slides.md"), source);
    assert!(matches!(after.slides[0].layout.source, LayoutSource::Local(_)));
    assert!(after.slides[0].markup.contains("class=\"fresh\""));
}

#[test]
fn test_deck_level_features() {
    let (renderer, _) = renderer_for(TempDir::new().expect("tempdir").path());
    let deck = renderer.build_from_str(
        Path::new("slides.md"),
        "---\ntitle: Features\ntransition: zoom\n---\n\
         # Welcome\n\n---\n\n\
         <!--\nbg: /img/bg.png\nclass: dark\n-->\n\
         ## Diagram\n\n```mermaid\ngraph TD; A-->B\n```\n\n---\n\n\
         ::: video https://www.youtube.com/watch?v=dQw4w9WgXcQ :::",
    );

    assert_eq!(deck.title(), Some("Features"));
    assert_eq!(deck.slides.len(), 3);
    assert_eq!(deck.slides[0].layout.name(), "hero");

    let diagram = &deck.slides[1].markup;
    assert!(diagram.contains("class=\"mermaid\""));
    assert!(diagram.contains("A--&gt;B"));
    // The layout escapes the style value; browsers decode it again.
    assert!(diagram.contains("background-image: url(&#x27;/img/bg.png&#x27;)"));
    assert!(diagram.contains("background-size: cover"));
    assert!(diagram.contains("dark"));

    assert!(deck.slides[2].markup.contains("youtube.com/embed/dQw4w9WgXcQ"));
    for slide in &deck.slides {
        assert!(slide.markup.contains("x-transition"));
    }
}
