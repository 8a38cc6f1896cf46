// ABOUTME: Markdown conversion and content transforms for slide bodies
// ABOUTME: Runs directive expansion, comrak parsing, tree rewrites and HTML output

mod callout;
mod diagram;
mod directive;
mod embed;
mod poll;

pub use callout::Callouts;
pub use diagram::DiagramFences;
pub use directive::{BlockDirective, DirectiveSet, GenericContainer};
pub use embed::{VideoEmbed, VideoSource};
pub use poll::{is_poll_id, poll_id, Poll};

use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use comrak::{format_html, parse_document, Arena, ComrakOptions};
use log::warn;

/// A rewrite applied to the parsed Markdown tree before HTML output.
pub trait TreeTransform: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply<'a>(&self, root: &'a AstNode<'a>, options: &ComrakOptions);
}

/// Drops thematic breaks so stray `---` lines never show up as rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleSuppression;

impl TreeTransform for RuleSuppression {
    fn name(&self) -> &'static str {
        "rule-suppression"
    }

    fn apply<'a>(&self, root: &'a AstNode<'a>, _options: &ComrakOptions) {
        let rules: Vec<_> = root
            .descendants()
            .filter(|node| matches!(node.data.borrow().value, NodeValue::ThematicBreak))
            .collect();
        for rule in rules {
            rule.detach();
        }
    }
}

/// Options used for every Markdown conversion.
pub fn markdown_options() -> ComrakOptions {
    let mut options = ComrakOptions::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.tasklist = true;
    options.extension.autolink = true;
    options.render.unsafe_ = true; // Slides may carry raw HTML
    options
}

/// The ordered chain of transforms that turns slide Markdown into HTML.
pub struct TransformPipeline {
    directives: DirectiveSet,
    tree: Vec<Box<dyn TreeTransform>>,
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl TransformPipeline {
    pub fn new(directives: DirectiveSet, tree: Vec<Box<dyn TreeTransform>>) -> Self {
        Self { directives, tree }
    }

    /// Diagram fences and callouts on the tree; video, poll and generic
    /// container directives at conversion time.
    pub fn standard() -> Self {
        Self::new(
            DirectiveSet::standard(),
            vec![Box::new(DiagramFences::default()), Box::new(Callouts)],
        )
    }

    /// Names of the tree transforms, in application order.
    pub fn tree_transforms(&self) -> Vec<&'static str> {
        self.tree.iter().map(|t| t.name()).collect()
    }

    /// Convert a slide's main content; horizontal rules are suppressed.
    pub fn render_content(&self, markdown: &str) -> String {
        self.render(markdown, true)
    }

    /// Convert speaker notes.
    pub fn render_notes(&self, markdown: &str) -> String {
        self.render(markdown, false)
    }

    fn render(&self, markdown: &str, suppress_rules: bool) -> String {
        let options = markdown_options();
        let source = self.directives.expand(markdown);

        let arena = Arena::new();
        let root = parse_document(&arena, &source, &options);
        for transform in &self.tree {
            transform.apply(root, &options);
        }
        if suppress_rules {
            RuleSuppression.apply(root, &options);
        }

        render_node(root, &options)
    }
}

/// Serialize one node (and its subtree) to HTML.
pub(crate) fn render_node<'a>(node: &'a AstNode<'a>, options: &ComrakOptions) -> String {
    let mut html = Vec::new();
    if let Err(e) = format_html(node, options, &mut html) {
        warn!("Failed to format HTML: {}", e);
    }
    String::from_utf8_lossy(&html).into_owned()
}

/// Turn a block node into a raw HTML block, discarding its children.
pub(crate) fn replace_with_html<'a>(node: &'a AstNode<'a>, html: String) {
    let children: Vec<_> = node.children().collect();
    for child in children {
        child.detach();
    }
    node.data.borrow_mut().value = NodeValue::HtmlBlock(NodeHtmlBlock {
        block_type: 6,
        literal: html,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_markdown() {
        let html = TransformPipeline::standard().render_content("# Title\n\nSome *text*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<p>Some <em>text</em>.</p>"));
    }

    #[test]
    fn test_rules_suppressed_in_content_only() {
        let pipeline = TransformPipeline::standard();
        let md = "Above\n\n***\n\nBelow";
        assert!(!pipeline.render_content(md).contains("<hr"));
        assert!(pipeline.render_notes(md).contains("<hr />"));
    }

    #[test]
    fn test_raw_html_passes_through() {
        let html = TransformPipeline::standard().render_content("<span class=\"x\">hi</span>");
        assert!(html.contains("<span class=\"x\">hi</span>"));
    }

    #[test]
    fn test_tables_enabled() {
        let html = TransformPipeline::standard().render_content("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_tree_transform_order() {
        assert_eq!(
            TransformPipeline::standard().tree_transforms(),
            vec!["diagram-fence", "callout"]
        );
    }
}
