// ABOUTME: Diagram fence transform for slide content
// ABOUTME: Emits diagram code fences as raw containers for client-side rendering

use super::{replace_with_html, TreeTransform};
use comrak::nodes::{AstNode, NodeValue};
use comrak::ComrakOptions;
use handlebars::html_escape;

/// Rewrites fenced code blocks in a diagram language (`mermaid` by default)
/// into `<div class="<lang>">` containers holding the diagram source.
#[derive(Debug, Clone)]
pub struct DiagramFences {
    languages: Vec<String>,
}

impl Default for DiagramFences {
    fn default() -> Self {
        Self::new(["mermaid"])
    }
}

impl DiagramFences {
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    fn diagram_language(&self, info: &str) -> Option<&str> {
        let lang = info.split_whitespace().next()?;
        self.languages
            .iter()
            .find(|known| known.eq_ignore_ascii_case(lang))
            .map(String::as_str)
    }
}

impl TreeTransform for DiagramFences {
    fn name(&self) -> &'static str {
        "diagram-fence"
    }

    fn apply<'a>(&self, root: &'a AstNode<'a>, _options: &ComrakOptions) {
        for node in root.descendants().collect::<Vec<_>>() {
            let html = match &node.data.borrow().value {
                NodeValue::CodeBlock(block) if block.fenced => self
                    .diagram_language(&block.info)
                    .map(|lang| format!("<div class=\"{}\">{}</div>\n", lang, html_escape(&block.literal))),
                _ => None,
            };
            if let Some(html) = html {
                replace_with_html(node, html);
            }
        }
    }
}
