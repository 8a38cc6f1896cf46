// ABOUTME: Video embed directive for slide content
// ABOUTME: Turns `::: video <url>` into a YouTube/Vimeo iframe or an HTML5 video element

use super::BlockDirective;
use handlebars::html_escape;
use url::Url;

const FRAME_CLASS: &str = "aspect-video w-full max-w-4xl mx-auto relative rounded-xl overflow-hidden shadow-2xl border border-white/10 bg-black my-8";
const PLAYER_CLASS: &str = "w-full h-full absolute inset-0";

/// Where a video directive points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    YouTube(String),
    Vimeo(String),
    /// Anything else, played by the browser directly.
    File(String),
}

fn is_video_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn youtube_id(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let id = if host == "youtu.be" {
        segments.next().map(str::to_string)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        match segments.next()? {
            "watch" => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            "embed" | "shorts" => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };
    id.filter(|id| is_video_id(id))
}

fn vimeo_id(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if host != "vimeo.com" && !host.ends_with(".vimeo.com") {
        return None;
    }
    url.path_segments()?
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .last()
        .map(str::to_string)
}

impl VideoSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let Ok(url) = Url::parse(raw) else {
            return Self::File(raw.to_string());
        };

        if let Some(id) = youtube_id(&url) {
            Self::YouTube(id)
        } else if let Some(id) = vimeo_id(&url) {
            Self::Vimeo(id)
        } else {
            Self::File(raw.to_string())
        }
    }

    /// Canonical embed URL for hosted players.
    pub fn embed_url(&self) -> Option<String> {
        match self {
            Self::YouTube(id) => Some(format!("https://www.youtube.com/embed/{}", id)),
            Self::Vimeo(id) => Some(format!("https://player.vimeo.com/video/{}", id)),
            Self::File(_) => None,
        }
    }

    fn mime_type(path: &str) -> &'static str {
        let path = path.split(['?', '#']).next().unwrap_or(path).to_lowercase();
        if path.ends_with(".webm") {
            "video/webm"
        } else if path.ends_with(".ogg") || path.ends_with(".ogv") {
            "video/ogg"
        } else {
            "video/mp4"
        }
    }

    /// The player element, without the surrounding frame.
    pub fn player_html(&self) -> String {
        match (self, self.embed_url()) {
            (_, Some(src)) => format!(
                "<iframe class=\"{}\" src=\"{}\" frameborder=\"0\" allow=\"accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture\" allowfullscreen></iframe>",
                PLAYER_CLASS, src
            ),
            (Self::File(src), None) => format!(
                "<video controls class=\"{}\"><source src=\"{}\" type=\"{}\">Your browser does not support the video tag.</video>",
                PLAYER_CLASS,
                html_escape(src),
                Self::mime_type(src)
            ),
            (_, None) => String::new(),
        }
    }
}

/// `::: video <url>`
#[derive(Debug, Default, Clone, Copy)]
pub struct VideoEmbed;

impl BlockDirective for VideoEmbed {
    fn name(&self) -> &'static str {
        "video"
    }

    fn open(&self, params: &str) -> String {
        let source = VideoSource::parse(params);
        format!("<div class=\"{}\">\n{}", FRAME_CLASS, source.player_html())
    }
}
