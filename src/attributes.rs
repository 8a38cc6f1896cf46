// ABOUTME: Attribute parsing for hyperslide documents
// ABOUTME: Extracts global front matter and per-slide comment-block overrides

use crate::splitter::FenceTracker;
use log::{debug, warn};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Resolved key/value attributes of a document or a slide.
pub type Attributes = BTreeMap<String, String>;

const FRONT_MATTER_MARKER: &str = "---";
const FRONT_MATTER_END_ALT: &str = "...";
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// A document split into its global attributes and the remaining body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub attributes: Attributes,
    pub body: String,
}

/// Split a raw document into front matter attributes and body.
///
/// A document without a leading `---` block, or whose block is neither a YAML
/// mapping nor blank, yields no attributes and the whole text as body. A
/// leading slide separator therefore stays in the body.
pub fn parse_front_matter(raw: &str) -> FrontMatter {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let no_front_matter = || FrontMatter {
        attributes: Attributes::new(),
        body: raw.to_string(),
    };

    let mut lines = text.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == FRONT_MATTER_MARKER => {}
        _ => return no_front_matter(),
    }

    let mut yaml = String::new();
    let mut consumed = None;
    // Byte offset of everything after the opening line.
    let mut offset = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
    for line in lines {
        offset += line.len();
        let trimmed = line.trim_end();
        if trimmed == FRONT_MATTER_MARKER || trimmed == FRONT_MATTER_END_ALT {
            consumed = Some(offset);
            break;
        }
        yaml.push_str(line);
    }

    let Some(consumed) = consumed else {
        return no_front_matter();
    };

    let attributes = match serde_yaml::from_str::<Value>(&yaml) {
        Ok(Value::Mapping(mapping)) => mapping
            .iter()
            .filter_map(|(key, value)| Some((stringify(key)?, stringify(value)?)))
            .collect(),
        Ok(Value::Null) if yaml.trim().is_empty() => Attributes::new(),
        Ok(Value::Null) => {
            debug!("Leading block holds no attributes, treating it as a separator");
            return no_front_matter();
        }
        Ok(other) => {
            warn!("Front matter is not a mapping ({:?}), ignoring it", other);
            return no_front_matter();
        }
        Err(e) => {
            warn!("Malformed front matter, ignoring it: {}", e);
            return no_front_matter();
        }
    };

    debug!("Parsed {} front matter attributes", attributes.len());
    FrontMatter {
        attributes,
        body: text[consumed..].to_string(),
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        other => serde_json::to_string(other).ok(),
    }
}

/// Pull the attributes out of the first HTML comment block of a slide chunk.
///
/// Returns the local attributes and the chunk with that comment removed.
/// A chunk without a complete comment is returned unchanged.
pub fn extract_local_attributes(chunk: &str) -> (Attributes, String) {
    let mut attributes = Attributes::new();

    let Some(start) = find_comment_open(chunk) else {
        return (attributes, trim_blank_lines(chunk).to_string());
    };
    let inner_start = start + COMMENT_OPEN.len();
    let Some(inner_len) = chunk[inner_start..].find(COMMENT_CLOSE) else {
        debug!("Unterminated attribute comment, keeping inherited attributes");
        return (attributes, trim_blank_lines(chunk).to_string());
    };

    for line in chunk[inner_start..inner_start + inner_len].lines() {
        if let Some((key, value)) = line.split_once(':') {
            let (key, value) = (key.trim(), value.trim());
            if !key.is_empty() && !value.is_empty() {
                attributes.insert(key.to_string(), value.to_string());
            }
        }
    }

    let end = inner_start + inner_len + COMMENT_CLOSE.len();
    let content = format!("{}{}", &chunk[..start], &chunk[end..]);
    (attributes, trim_blank_lines(&content).to_string())
}

/// Byte offset of the first `<!--` outside fenced code.
fn find_comment_open(chunk: &str) -> Option<usize> {
    let mut fences = FenceTracker::default();
    let mut offset = 0;
    for line in chunk.split_inclusive('\n') {
        if !fences.observe(line) {
            if let Some(pos) = line.find(COMMENT_OPEN) {
                return Some(offset + pos);
            }
        }
        offset += line.len();
    }
    None
}

/// Overlay slide-local attributes on the global ones; local keys win.
pub fn merge(global: &Attributes, local: Attributes) -> Attributes {
    let mut merged = global.clone();
    merged.extend(local);
    merged
}

/// Whether an attribute value reads as an enabled flag.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "on" | "1"
    )
}

/// Trim leading blank lines and trailing whitespace, keeping the
/// indentation of the first content line.
pub(crate) fn trim_blank_lines(text: &str) -> &str {
    let text = text.trim_end();
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_matter_parsed() {
        let raw = "---\ntitle: Demo\nhyperslide: true\ncount: 3\n---\n# Hello\n";
        let fm = parse_front_matter(raw);
        assert_eq!(fm.attributes.get("title").map(String::as_str), Some("Demo"));
        assert_eq!(fm.attributes.get("hyperslide").map(String::as_str), Some("true"));
        assert_eq!(fm.attributes.get("count").map(String::as_str), Some("3"));
        assert_eq!(fm.body, "# Hello\n");
    }

    #[test]
    fn test_front_matter_absent() {
        let raw = "# Just a slide\n";
        let fm = parse_front_matter(raw);
        assert!(fm.attributes.is_empty());
        assert_eq!(fm.body, raw);
    }

    #[test]
    fn test_front_matter_dot_terminator() {
        let fm = parse_front_matter("---\ntheme: dark\n...\nbody");
        assert_eq!(fm.attributes.get("theme").map(String::as_str), Some("dark"));
        assert_eq!(fm.body, "body");
    }

    #[test]
    fn test_malformed_front_matter_degrades() {
        let raw = "---\ntitle: [unclosed\n---\n# Body\n";
        let fm = parse_front_matter(raw);
        assert!(fm.attributes.is_empty());
        assert_eq!(fm.body, raw);
    }

    #[test]
    fn test_unterminated_front_matter_is_body() {
        let raw = "---\ntitle: Demo\n# Body\n";
        let fm = parse_front_matter(raw);
        assert!(fm.attributes.is_empty());
        assert_eq!(fm.body, raw);
    }

    #[test]
    fn test_scalar_front_matter_is_ignored() {
        let raw = "---\njust a string\n---\nbody";
        let fm = parse_front_matter(raw);
        assert!(fm.attributes.is_empty());
        assert_eq!(fm.body, raw);
    }

    #[test]
    fn test_leading_separator_is_not_front_matter() {
        let raw = "---\n\n# My Talk\n\n---\n\n## Agenda\n";
        let fm = parse_front_matter(raw);
        assert!(fm.attributes.is_empty());
        assert_eq!(fm.body, raw);
    }

    #[test]
    fn test_blank_front_matter_is_consumed() {
        let fm = parse_front_matter("---\n\n---\n# Body");
        assert!(fm.attributes.is_empty());
        assert_eq!(fm.body, "# Body");
    }

    #[test]
    fn test_comment_inside_code_fence_is_not_an_attribute_block() {
        let chunk = "# Markup\n\n```html\n<!-- note: keep me -->\n<p>hi</p>\n```";
        let (attrs, content) = extract_local_attributes(chunk);
        assert!(attrs.is_empty());
        assert_eq!(content, chunk);

        let chunk = "```\n<!-- a: b -->\n```\n<!-- layout: hero -->\n# Title";
        let (attrs, content) = extract_local_attributes(chunk);
        assert_eq!(attrs.get("layout").map(String::as_str), Some("hero"));
        assert!(!attrs.contains_key("a"));
        assert_eq!(content, "```\n<!-- a: b -->\n```\n\n# Title");
    }

    #[test]
    fn test_local_attributes_first_comment_only() {
        let chunk = "<!--\nlayout: hero\nbg: https://example.com/a.png\nnot an attribute\nempty:\n-->\n# Title\n<!-- layout: split -->";
        let (attrs, content) = extract_local_attributes(chunk);
        assert_eq!(attrs.get("layout").map(String::as_str), Some("hero"));
        assert_eq!(
            attrs.get("bg").map(String::as_str),
            Some("https://example.com/a.png")
        );
        assert!(!attrs.contains_key("empty"));
        assert_eq!(attrs.len(), 2);
        assert_eq!(content, "# Title\n<!-- layout: split -->");
    }

    #[test]
    fn test_single_line_comment() {
        let (attrs, content) = extract_local_attributes("<!-- transition: zoom -->\n\nBody text");
        assert_eq!(attrs.get("transition").map(String::as_str), Some("zoom"));
        assert_eq!(content, "Body text");
    }

    #[test]
    fn test_unterminated_comment_is_ignored() {
        let (attrs, content) = extract_local_attributes("<!-- layout: hero\n# Title");
        assert!(attrs.is_empty());
        assert_eq!(content, "<!-- layout: hero\n# Title");
    }

    #[test]
    fn test_local_overrides_global() {
        let mut global = Attributes::new();
        global.insert("layout".into(), "default".into());
        global.insert("theme".into(), "dark".into());
        let mut local = Attributes::new();
        local.insert("layout".into(), "hero".into());

        let merged = merge(&global, local);
        assert_eq!(merged.get("layout").map(String::as_str), Some("hero"));
        assert_eq!(merged.get("theme").map(String::as_str), Some("dark"));
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy("true"));
        assert!(is_truthy(" Yes "));
        assert!(is_truthy("1"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("auto"));
    }

    #[test]
    fn test_trim_blank_lines_keeps_indent() {
        assert_eq!(trim_blank_lines("\n  \n    code\n\n"), "    code");
    }
}
