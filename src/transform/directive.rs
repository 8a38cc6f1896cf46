// ABOUTME: Container directives for slide content
// ABOUTME: Expands `::: name params` blocks into HTML containers before Markdown parsing

use super::{Poll, VideoEmbed};
use crate::splitter::FenceTracker;
use handlebars::html_escape;
use log::debug;

const MARKER: char = ':';
const MIN_MARKER_LEN: usize = 3;

/// A named `::: name params` block directive.
pub trait BlockDirective: Send + Sync {
    /// The directive keyword, e.g. `video`.
    fn name(&self) -> &'static str;

    /// Opening HTML for the given parameters. It must not contain blank
    /// lines so that it stays a single HTML block.
    fn open(&self, params: &str) -> String;

    fn close(&self) -> &'static str {
        "</div>"
    }
}

/// Fallback for any other name: `<div class="name params">`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericContainer;

impl GenericContainer {
    fn open(&self, name: &str, params: &str) -> String {
        if params.is_empty() {
            format!("<div class=\"{}\">", html_escape(name))
        } else {
            format!("<div class=\"{} {}\">", html_escape(name), html_escape(params))
        }
    }
}

enum DirectiveLine<'a> {
    Open {
        name: &'a str,
        params: &'a str,
        self_closing: bool,
    },
    Close,
}

fn parse_line(line: &str) -> Option<DirectiveLine<'_>> {
    let trimmed = line.trim();
    let markers = trimmed.chars().take_while(|&c| c == MARKER).count();
    if markers < MIN_MARKER_LEN {
        return None;
    }

    let mut rest = trimmed[markers..].trim();
    if rest.is_empty() {
        return Some(DirectiveLine::Close);
    }

    let mut self_closing = false;
    if let Some(stripped) = rest.strip_suffix(":::") {
        rest = stripped.trim_end_matches(MARKER).trim_end();
        self_closing = true;
    }

    let (name, params) = match rest.split_once(char::is_whitespace) {
        Some((name, params)) => (name, params.trim()),
        None => (rest, ""),
    };
    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid_name.then_some(DirectiveLine::Open {
        name,
        params,
        self_closing,
    })
}

/// The set of directives recognized while converting slide Markdown.
pub struct DirectiveSet {
    named: Vec<Box<dyn BlockDirective>>,
    fallback: GenericContainer,
}

impl Default for DirectiveSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl DirectiveSet {
    pub fn new(named: Vec<Box<dyn BlockDirective>>) -> Self {
        Self {
            named,
            fallback: GenericContainer,
        }
    }

    /// `video` and `poll`, plus generic containers for everything else.
    pub fn standard() -> Self {
        Self::new(vec![Box::new(VideoEmbed), Box::new(Poll)])
    }

    fn open(&self, name: &str, params: &str) -> (String, &'static str) {
        match self.named.iter().find(|d| d.name() == name) {
            Some(directive) => (directive.open(params), directive.close()),
            None => (self.fallback.open(name, params), "</div>"),
        }
    }

    /// Replace directive lines with raw HTML blocks. Lines inside code
    /// fences are left alone; directives still open at the end are closed.
    pub fn expand(&self, markdown: &str) -> String {
        let mut out = String::with_capacity(markdown.len());
        let mut fences = FenceTracker::default();
        let mut open: Vec<&'static str> = Vec::new();

        for line in markdown.lines() {
            if fences.observe(line) {
                out.push_str(line);
                out.push('\n');
                continue;
            }

            match parse_line(line) {
                Some(DirectiveLine::Open {
                    name,
                    params,
                    self_closing,
                }) => {
                    let (html, close) = self.open(name, params);
                    push_block(&mut out, &html);
                    if self_closing {
                        push_block(&mut out, close);
                    } else {
                        open.push(close);
                    }
                }
                Some(DirectiveLine::Close) if !open.is_empty() => {
                    if let Some(close) = open.pop() {
                        push_block(&mut out, close);
                    }
                }
                _ => {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }

        if !open.is_empty() {
            debug!("Closing {} unterminated directives", open.len());
        }
        while let Some(close) = open.pop() {
            push_block(&mut out, close);
        }
        out
    }
}

/// Emit HTML as its own block, separated from Markdown by blank lines.
fn push_block(out: &mut String, html: &str) {
    out.push('\n');
    out.push_str(html);
    out.push_str("\n\n");
}
