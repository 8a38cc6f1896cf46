// ABOUTME: HTML pages served around the slide deck
// ABOUTME: Renders the viewer shell and presenter console from embedded Handlebars templates

use crate::errors::Result;
use crate::resources::{ResourceFile, ResourceKind};
use crate::watch::ROOT_STYLESHEET;
use handlebars::Handlebars;
use log::warn;
use serde::Serialize;
use std::path::Path;

const SHELL_TEMPLATE: &str = include_str!("../assets/shell.html");
const SPEAKER_TEMPLATE: &str = include_str!("../assets/speaker.html");
const SLIDESHOW_JS: &str = include_str!("../assets/slideshow.js");
const SPEAKER_JS: &str = include_str!("../assets/speaker.js");

pub const DEFAULT_TITLE: &str = "HyperSlide";

/// Extra resources and metadata for a page.
#[derive(Debug, Clone, Copy)]
pub struct PageOptions<'a> {
    pub title: &'a str,
    pub root: &'a Path,
    pub css: &'a [ResourceFile],
    pub js: &'a [ResourceFile],
}

#[derive(Serialize)]
struct ShellContext<'a> {
    title: &'a str,
    live: bool,
    slides: &'a str,
    stylesheets: Vec<String>,
    scripts: Vec<String>,
    client_js: &'static str,
}

#[derive(Serialize)]
struct SpeakerContext<'a> {
    title: &'a str,
    stylesheets: Vec<String>,
    speaker_js: &'static str,
}

/// Renderer for the pages that wrap the slide fragments.
pub struct Pages {
    templates: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut templates = Handlebars::new();
        templates.register_template_string("shell", SHELL_TEMPLATE)?;
        templates.register_template_string("speaker", SPEAKER_TEMPLATE)?;
        Ok(Self { templates })
    }

    /// The viewer shell for the dev server; slides arrive via `/slides`.
    pub fn live_shell(&self, options: &PageOptions<'_>) -> Result<String> {
        let context = ShellContext {
            title: options.title,
            live: true,
            slides: "",
            stylesheets: stylesheet_tags(options, false),
            scripts: script_tags(options, false),
            client_js: SLIDESHOW_JS,
        };
        Ok(self.templates.render("shell", &context)?)
    }

    /// A standalone shell with the slides inlined and local resources embedded.
    pub fn static_shell(&self, options: &PageOptions<'_>, slides: &str) -> Result<String> {
        let context = ShellContext {
            title: options.title,
            live: false,
            slides,
            stylesheets: stylesheet_tags(options, true),
            scripts: script_tags(options, true),
            client_js: SLIDESHOW_JS,
        };
        Ok(self.templates.render("shell", &context)?)
    }

    /// The presenter console.
    pub fn speaker(&self, options: &PageOptions<'_>) -> Result<String> {
        let context = SpeakerContext {
            title: options.title,
            stylesheets: stylesheet_tags(options, false),
            speaker_js: SPEAKER_JS,
        };
        Ok(self.templates.render("speaker", &context)?)
    }
}

/// Tags for each resource, falling back to a link when a local file can't be embedded.
fn resource_tags(resources: &[ResourceFile], kind: ResourceKind, embed: bool, root: &Path) -> Vec<String> {
    resources
        .iter()
        .map(|resource| {
            resource.tag(kind, embed, root).unwrap_or_else(|e| {
                warn!("Could not embed {}: {}", resource.path, e);
                resource.link_tag(kind)
            })
        })
        .collect()
}

fn stylesheet_tags(options: &PageOptions<'_>, embed: bool) -> Vec<String> {
    let mut css = options.css.to_vec();
    let root_css = ResourceFile::new(ROOT_STYLESHEET);
    if options.root.join(ROOT_STYLESHEET).is_file() && !css.contains(&root_css) {
        css.push(root_css);
    }
    resource_tags(&css, ResourceKind::Css, embed, options.root)
}

fn script_tags(options: &PageOptions<'_>, embed: bool) -> Vec<String> {
    resource_tags(options.js, ResourceKind::Js, embed, options.root)
}
