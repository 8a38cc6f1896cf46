// ABOUTME: Callout transform for slide content
// ABOUTME: Rewrites `> [!KIND] title` block quotes into styled admonition containers

use super::{render_node, replace_with_html, TreeTransform};
use comrak::nodes::{AstNode, NodeValue};
use comrak::ComrakOptions;
use handlebars::html_escape;

/// Rewrites block quotes opening with `[!KIND]` into callout containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Callouts;

impl TreeTransform for Callouts {
    fn name(&self) -> &'static str {
        "callout"
    }

    fn apply<'a>(&self, root: &'a AstNode<'a>, options: &ComrakOptions) {
        let quotes: Vec<_> = root
            .descendants()
            .filter(|node| matches!(node.data.borrow().value, NodeValue::BlockQuote))
            .collect();

        // Innermost first, so a nested callout is already HTML when its parent renders.
        for quote in quotes.into_iter().rev() {
            if let Some(html) = rewrite(quote, options) {
                replace_with_html(quote, html);
            }
        }
    }
}

/// Split `[!KIND] rest` into the kind and the rest of the line.
fn parse_marker(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("[!")?;
    let end = rest.find(']')?;
    let kind = &rest[..end];
    let valid = !kind.is_empty()
        && kind
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then(|| (kind, &rest[end + 1..]))
}

fn is_line_break(node: &AstNode<'_>) -> bool {
    matches!(
        node.data.borrow().value,
        NodeValue::SoftBreak | NodeValue::LineBreak
    )
}

fn rewrite<'a>(quote: &'a AstNode<'a>, options: &ComrakOptions) -> Option<String> {
    let paragraph = quote.first_child()?;
    if !matches!(paragraph.data.borrow().value, NodeValue::Paragraph) {
        return None;
    }

    let first_line: Vec<_> = paragraph
        .children()
        .take_while(|node| !is_line_break(node))
        .collect();
    let line_break = paragraph.children().nth(first_line.len());

    // The marker may span several adjacent text nodes.
    let mut leading = String::new();
    let mut text_nodes = 0;
    for node in &first_line {
        match &node.data.borrow().value {
            NodeValue::Text(text) => leading.push_str(text),
            _ => break,
        }
        text_nodes += 1;
    }

    let (kind, rest) = parse_marker(&leading)?;
    let mut title = html_escape(rest.trim_start());
    for node in &first_line[text_nodes..] {
        title.push_str(&render_node(node, options));
    }
    let title = match title.trim() {
        "" => kind.to_uppercase(),
        explicit => explicit.to_string(),
    };
    let class = kind.to_lowercase();

    for node in first_line {
        node.detach();
    }
    if let Some(node) = line_break {
        node.detach();
    }
    if paragraph.first_child().is_none() {
        paragraph.detach();
    }

    let body: String = quote
        .children()
        .map(|child| render_node(child, options))
        .collect();

    Some(format!(
        "<div class=\"callout callout-{class} p-4 my-4 rounded-lg border-l-4\">\n\
         <h3 class=\"callout-title font-bold mb-2\">{title}</h3>\n\
         {body}</div>\n"
    ))
}

#[cfg(test)]
mod tests {
    use crate::transform::TransformPipeline;

    fn render(md: &str) -> String {
        TransformPipeline::standard().render_content(md)
    }

    #[test]
    fn test_callout_with_title_and_body() {
        let html = render("> [!WARNING] Careful\nDo this");
        assert!(html.contains("class=\"callout callout-warning"));
        assert!(html.contains(">Careful</h3>"));
        assert!(html.contains("<p>Do this</p>"));
        assert!(!html.contains("<blockquote>"));
        assert!(!html.contains("[!WARNING]"));
    }

    #[test]
    fn test_callout_default_title() {
        let html = render("> [!Note]\n> Remember the milk");
        assert!(html.contains("callout-note"));
        assert!(html.contains(">NOTE</h3>"));
        assert!(html.contains("<p>Remember the milk</p>"));
    }

    #[test]
    fn test_callout_title_only() {
        let html = render("> [!TIP] Use the keyboard");
        assert!(html.contains("callout-tip"));
        assert!(html.contains(">Use the keyboard</h3>"));
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn test_callout_keeps_following_blocks() {
        let html = render("> [!INFO]\n> First\n>\n> - item");
        assert!(html.contains("callout-info"));
        assert!(html.contains("<p>First</p>"));
        assert!(html.contains("<li>item</li>"));
    }

    #[test]
    fn test_callout_title_inline_markup() {
        let html = render("> [!ERROR] Do *not* panic");
        assert!(html.contains(">Do <em>not</em> panic</h3>"));
    }

    #[test]
    fn test_plain_blockquote_untouched() {
        let html = render("> Just a quote");
        assert!(html.contains("<blockquote>"));
        assert!(!html.contains("callout"));
    }

    #[test]
    fn test_nested_callout() {
        let html = render("> [!INFO] Outer\n>\n> > [!WARNING] Inner");
        assert!(html.contains("callout-info"));
        assert!(html.contains("callout-warning"));
        assert!(!html.contains("<blockquote>"));
    }
}
