//! Outside requests to open the app somewhere: `artivault://` URLs and spoken shortcut phrases.

use crate::store::CanvasID;

pub const SCHEME: &str = "artivault";

/// Phrases a voice assistant may hand over to create a canvas.
pub const NEW_CANVAS_PHRASES: [&str; 5] = [
    "Open a new canvas",
    "Create a canvas",
    "Start a new project",
    "Begin drawing",
    "Launch a canvas",
];

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LaunchAction {
    /// Create an empty canvas in the default folder and open it.
    OpenNewCanvas,
    OpenCanvas(CanvasID),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LaunchError {
    #[error("invalid url: {}", .0)]
    Url(#[from] url::ParseError),
    #[error("unsupported scheme {}", .0)]
    Scheme(String),
    #[error("unrecognized launch request {}", .0)]
    Unrecognized(String),
}

/// Parse a launch URL. Scheme and host are case-insensitive.
///
/// * `artivault://openCanvas` opens a new canvas.
/// * `artivault://canvas/<id>` opens an existing one.
pub fn parse_url(text: &str) -> Result<LaunchAction, LaunchError> {
    let url = url::Url::parse(text.trim())?;
    if !url.scheme().eq_ignore_ascii_case(SCHEME) {
        return Err(LaunchError::Scheme(url.scheme().to_owned()));
    }
    let host = url.host_str().unwrap_or_default();
    let path = url.path().trim_matches('/');
    if host.eq_ignore_ascii_case("openCanvas") && path.is_empty() {
        Ok(LaunchAction::OpenNewCanvas)
    } else if host.eq_ignore_ascii_case("canvas") {
        path.parse()
            .map(LaunchAction::OpenCanvas)
            .map_err(|_| LaunchError::Unrecognized(text.to_owned()))
    } else {
        Err(LaunchError::Unrecognized(text.to_owned()))
    }
}

/// Match a spoken phrase, ignoring case, surrounding space and trailing punctuation.
#[must_use]
pub fn parse_phrase(phrase: &str) -> Option<LaunchAction> {
    let phrase = phrase
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim_end();
    NEW_CANVAS_PHRASES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(phrase))
        .then_some(LaunchAction::OpenNewCanvas)
}

/// Either a URL or a phrase.
pub fn parse(request: &str) -> Result<LaunchAction, LaunchError> {
    if let Some(action) = parse_phrase(request) {
        return Ok(action);
    }
    parse_url(request)
}
