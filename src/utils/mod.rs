use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Fallback base name used when a title sanitizes down to nothing.
const FALLBACK_NAME: &str = "download";

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id pattern"));

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Turn a video title into the stem used for the output file.
///
/// Spaces become underscores so the result is shell friendly.
pub fn base_filename(title: &str) -> String {
    let base = sanitize_filename(&title.trim().replace(' ', "_"));
    let base = base.trim_matches(|c| c == '.' || c == ' ');

    if base.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        base.to_string()
    }
}

/// Pick a file name for `title` that does not yet exist in `dir`.
///
/// Returns `<base>.<ext>` when free, otherwise the first free
/// `<base>_N.<ext>` counting up from 1.
pub fn unique_filename(dir: &Path, title: &str, extension: &str) -> String {
    let base = base_filename(title);
    let extension = extension.trim_start_matches('.');

    let mut filename = format!("{}.{}", base, extension);
    let mut counter = 1u32;

    while dir.join(&filename).exists() {
        filename = format!("{}_{}.{}", base, counter, extension);
        counter += 1;
    }

    filename
}

/// Extract the 11 character video ID from a YouTube URL or a bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if VIDEO_ID.is_match(input) {
        return Some(input.to_string());
    }

    let url = Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{}", input)))
        .ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("shorts" | "embed" | "live" | "v") => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }?;

    VIDEO_ID.is_match(&candidate).then_some(candidate)
}
