// ABOUTME: Slide splitting for hyperslide documents
// ABOUTME: Divides a document body into slide chunks and separates speaker notes

use crate::attributes::{is_truthy, Attributes};
use log::debug;

/// Global attribute that turns on heading-based splitting.
pub const AUTO_SPLIT_ATTRIBUTE: &str = "hyperslide";

const NOTES_MARKER: &str = "???";

/// How a document body was divided into slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Explicit `---` separator lines.
    Separator,
    /// A new slide at every H1 or H2 heading.
    Headings,
    /// The whole body is one slide.
    Single,
}

/// Tracks fenced code blocks while scanning Markdown line by line.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    /// Feed the next line; returns true if the line belongs to a code fence
    /// (either a delimiter or a line inside one).
    pub(crate) fn observe(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let marker = if line.len() - trimmed.len() <= 3 {
            fence_marker(trimmed)
        } else {
            None
        };

        match (self.open, marker) {
            (None, Some(fence)) => {
                self.open = Some(fence);
                true
            }
            (Some((ch, len)), Some((found, found_len)))
                if found == ch
                    && found_len >= len
                    && trimmed.trim_end().chars().all(|c| c == ch) =>
            {
                self.open = None;
                true
            }
            (Some(_), _) => true,
            (None, None) => false,
        }
    }
}

fn fence_marker(text: &str) -> Option<(char, usize)> {
    let ch = text.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }
    let len = text.chars().take_while(|&c| c == ch).count();
    (len >= 3).then_some((ch, len))
}

/// Level of an ATX heading line (`# `, `## `, ...), if the line is one.
pub(crate) fn heading_level(line: &str) -> Option<usize> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    match line[level..].chars().next() {
        Some(c) if c == ' ' || c == '\t' => Some(level),
        _ => None,
    }
}

fn is_separator(line: &str) -> bool {
    let line = line.trim_end();
    line.len() >= 3 && line.chars().all(|c| c == '-')
}

fn is_blank(line: Option<&&str>) -> bool {
    line.map_or(true, |l| l.trim().is_empty())
}

/// Indices of the lines that act as explicit slide separators.
fn separator_lines(lines: &[&str]) -> Vec<usize> {
    let mut fences = FenceTracker::default();
    let mut found = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if fences.observe(line) {
            continue;
        }
        let before = if i == 0 { None } else { lines.get(i - 1) };
        if is_separator(line) && is_blank(before) && is_blank(lines.get(i + 1)) {
            found.push(i);
        }
    }
    found
}

/// Pick the splitting policy for a document body.
pub fn split_mode(body: &str, global: &Attributes) -> SplitMode {
    let lines: Vec<&str> = body.lines().collect();
    if !separator_lines(&lines).is_empty() {
        SplitMode::Separator
    } else if global
        .get(AUTO_SPLIT_ATTRIBUTE)
        .is_some_and(|v| is_truthy(v))
    {
        SplitMode::Headings
    } else {
        SplitMode::Single
    }
}

/// Divide a document body into non-empty slide chunks, in document order.
pub fn split_slides(body: &str, global: &Attributes) -> Vec<String> {
    let lines: Vec<&str> = body.lines().collect();
    let mode = split_mode(body, global);

    let chunks: Vec<String> = match mode {
        SplitMode::Separator => {
            let mut chunks = Vec::new();
            let mut start = 0;
            for sep in separator_lines(&lines) {
                chunks.push(lines[start..sep].join("\n"));
                start = sep + 1;
            }
            chunks.push(lines[start..].join("\n"));
            chunks
        }
        SplitMode::Headings => {
            let mut chunks = Vec::new();
            let mut current: Vec<&str> = Vec::new();
            let mut fences = FenceTracker::default();
            for &line in &lines {
                let in_code = fences.observe(line);
                let starts_slide = !in_code && matches!(heading_level(line), Some(1 | 2));
                if starts_slide && !current.is_empty() {
                    chunks.push(current.join("\n"));
                    current.clear();
                }
                current.push(line);
            }
            if !current.is_empty() {
                chunks.push(current.join("\n"));
            }
            chunks
        }
        SplitMode::Single => vec![body.to_string()],
    };

    let chunks: Vec<String> = chunks
        .into_iter()
        .filter(|chunk| !chunk.trim().is_empty())
        .collect();
    debug!("Split body into {} slides ({:?} mode)", chunks.len(), mode);
    chunks
}

/// Separate a slide chunk into main content and speaker notes at the first
/// `???` line.
pub fn split_notes(chunk: &str) -> (String, Option<String>) {
    let lines: Vec<&str> = chunk.lines().collect();
    let mut fences = FenceTracker::default();
    let marker = lines
        .iter()
        .position(|line| !fences.observe(line) && line.trim() == NOTES_MARKER);

    match marker {
        Some(i) => {
            let main = lines[..i].join("\n");
            let notes = lines[i + 1..].join("\n");
            let notes = (!notes.trim().is_empty()).then_some(notes);
            (main, notes)
        }
        None => (chunk.to_string(), None),
    }
}
