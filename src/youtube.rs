use once_cell::sync::Lazy;
use regex::Regex;

const FALLBACK_FILENAME: &str = "youtube_video.md";

static YOUTUBE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.?be)/.+$").expect("valid regex")
});

// Order matters: the first pattern that matches decides the id.
static ID_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("valid regex"),
        Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})").expect("valid regex"),
        Regex::new(r"embed/([0-9A-Za-z_-]{11})").expect("valid regex"),
    ]
});

pub fn is_valid(url: &str) -> bool {
    YOUTUBE_URL.is_match(url)
}

pub fn extract_id(url: &str) -> Option<&str> {
    ID_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    })
}

pub fn markdown_filename(url: &str) -> String {
    match extract_id(url) {
        Some(id) => format!("youtube_{id}.md"),
        None => FALLBACK_FILENAME.to_string(),
    }
}
