//! Link parsing: catalog URL or URI → (service, link type, id).
//!
//! Only the link's shape is checked here. Whether the id exists is the
//! resolver's business.

use serde::Serialize;
use std::fmt;
use url::Url;

use crate::error::QueueError;

/// Catalog a link points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    /// Primary catalog, handled by the resolver.
    Deezer,
    /// Secondary catalog, handled by the plugin registered for it.
    Spotify,
}

impl Service {
    pub fn as_str(self) -> &'static str {
        match self {
            Service::Deezer => "deezer",
            Service::Spotify => "spotify",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Track,
    Album,
    Playlist,
    Artist,
    ArtistTop,
    ArtistDiscography,
}

impl LinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkType::Track => "track",
            LinkType::Album => "album",
            LinkType::Playlist => "playlist",
            LinkType::Artist => "artist",
            LinkType::ArtistTop => "artist_top",
            LinkType::ArtistDiscography => "artist_discography",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLink {
    /// The link as submitted (trimmed).
    pub link: String,
    pub service: Service,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub id: String,
}

const DEEZER_HOSTS: &[&str] = &["deezer.com", "www.deezer.com"];
const DEEZER_SHORT_HOSTS: &[&str] = &["deezer.page.link", "link.deezer.com"];
const SPOTIFY_HOST: &str = "open.spotify.com";

/// Parse a catalog link.
///
/// Errors: `LinkParse` when the input is not a link at all,
/// `UnsupportedLink` for any link whose host or path is not a known shape.
pub fn parse_link(input: &str) -> Result<ParsedLink, QueueError> {
    let link = input.trim();
    let url = parse_url(link)?;
    let unsupported = || QueueError::UnsupportedLink {
        link: link.to_string(),
    };

    let (service, link_type, id) = match url.scheme() {
        "spotify" => parse_spotify_uri(url.path()).ok_or_else(unsupported)?,
        "http" | "https" => {
            let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
            let segments: Vec<&str> = url
                .path_segments()
                .map(|s| s.filter(|seg| !seg.is_empty()).collect())
                .unwrap_or_default();
            if DEEZER_HOSTS.contains(&host.as_str()) {
                parse_deezer_path(&segments).ok_or_else(unsupported)?
            } else if host == SPOTIFY_HOST {
                parse_spotify_path(&segments).ok_or_else(unsupported)?
            } else {
                if DEEZER_SHORT_HOSTS.contains(&host.as_str()) {
                    tracing::debug!(link, "short links must be expanded by the resolver");
                }
                return Err(unsupported());
            }
        }
        _ => return Err(unsupported()),
    };

    Ok(ParsedLink {
        link: link.to_string(),
        service,
        link_type,
        id,
    })
}

/// Accepts full URLs, `spotify:` URIs and scheme-less `host/path` links.
fn parse_url(link: &str) -> Result<Url, QueueError> {
    let not_a_link = || QueueError::LinkParse {
        link: link.to_string(),
    };
    if link.is_empty() || link.chars().any(char::is_whitespace) {
        return Err(not_a_link());
    }
    match Url::parse(link) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) if looks_like_host_path(link) => {
            Url::parse(&format!("https://{}", link)).map_err(|_| not_a_link())
        }
        Err(_) => Err(not_a_link()),
    }
}

fn looks_like_host_path(link: &str) -> bool {
    let host = link.split('/').next().unwrap_or_default();
    host.contains('.') && !host.starts_with('.') && !host.ends_with('.')
}

fn parse_deezer_path(segments: &[&str]) -> Option<(Service, LinkType, String)> {
    let segments = match segments.first() {
        Some(first) if is_locale(first) => &segments[1..],
        _ => segments,
    };
    let (kind, id, rest) = match segments {
        [kind, id, rest @ ..] => (*kind, *id, rest),
        _ => return None,
    };
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let link_type = match (kind, rest) {
        ("track", []) => LinkType::Track,
        ("album", []) => LinkType::Album,
        ("playlist", []) => LinkType::Playlist,
        ("artist", []) => LinkType::Artist,
        ("artist", ["top_track"]) => LinkType::ArtistTop,
        ("artist", ["discography"]) => LinkType::ArtistDiscography,
        _ => return None,
    };
    Some((Service::Deezer, link_type, id.to_string()))
}

/// `en`, `fr`, `pt-br` and similar.
fn is_locale(segment: &str) -> bool {
    let mut parts = segment.split('-');
    let lang_ok = parts
        .next()
        .map(|p| p.len() == 2 && p.bytes().all(|b| b.is_ascii_alphabetic()))
        .unwrap_or(false);
    let region_ok = parts.all(|p| p.len() == 2 && p.bytes().all(|b| b.is_ascii_alphabetic()));
    lang_ok && region_ok
}

fn parse_spotify_path(segments: &[&str]) -> Option<(Service, LinkType, String)> {
    let segments = match segments.first() {
        Some(first) if first.starts_with("intl-") => &segments[1..],
        _ => segments,
    };
    match segments {
        [kind, id] => spotify_item(kind, id),
        _ => None,
    }
}

fn parse_spotify_uri(path: &str) -> Option<(Service, LinkType, String)> {
    let mut parts = path.split(':');
    let kind = parts.next()?;
    let id = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    spotify_item(kind, id)
}

fn spotify_item(kind: &str, id: &str) -> Option<(Service, LinkType, String)> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    let link_type = match kind {
        "track" => LinkType::Track,
        "album" => LinkType::Album,
        "playlist" => LinkType::Playlist,
        _ => return None,
    };
    Some((Service::Spotify, link_type, id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(link: &str) -> (Service, LinkType, String) {
        let p = parse_link(link).unwrap();
        (p.service, p.link_type, p.id)
    }

    #[test]
    fn deezer_shapes() {
        assert_eq!(
            parsed("https://www.deezer.com/track/3135556"),
            (Service::Deezer, LinkType::Track, "3135556".to_string())
        );
        assert_eq!(
            parsed("https://www.deezer.com/en/album/302127"),
            (Service::Deezer, LinkType::Album, "302127".to_string())
        );
        assert_eq!(
            parsed("deezer.com/pt-br/playlist/908622995?utm=x"),
            (Service::Deezer, LinkType::Playlist, "908622995".to_string())
        );
        assert_eq!(
            parsed("https://www.deezer.com/artist/27/top_track").1,
            LinkType::ArtistTop
        );
        assert_eq!(
            parsed("https://www.deezer.com/fr/artist/27/discography").1,
            LinkType::ArtistDiscography
        );
        assert_eq!(parsed("https://www.deezer.com/artist/27/").1, LinkType::Artist);
    }

    #[test]
    fn spotify_shapes() {
        assert_eq!(
            parsed("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"),
            (
                Service::Spotify,
                LinkType::Track,
                "4uLU6hMCjMI75M1A2tKUQC".to_string()
            )
        );
        assert_eq!(
            parsed("https://open.spotify.com/intl-de/album/1ATL5GLyefJaxhQzSPVrLX").1,
            LinkType::Album
        );
        assert_eq!(
            parsed("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M"),
            (
                Service::Spotify,
                LinkType::Playlist,
                "37i9dQZF1DXcBWIGoYBM5M".to_string()
            )
        );
    }

    #[test]
    fn not_a_link() {
        for input in ["", "   ", "hello world", "nope"] {
            let err = parse_link(input).unwrap_err();
            assert!(matches!(err, QueueError::LinkParse { .. }), "{input:?}");
        }
    }

    #[test]
    fn unsupported_shapes() {
        for input in [
            "https://example.com/track/1",
            "https://www.deezer.com/track/abc",
            "https://www.deezer.com/show/1",
            "https://www.deezer.com/artist/27/related",
            "https://deezer.page.link/abcdef",
            "https://open.spotify.com/artist/0TnOYISbd1XYRBk9myaseg",
            "spotify:episode:1",
            "ftp://www.deezer.com/track/1",
        ] {
            let err = parse_link(input).unwrap_err();
            assert!(matches!(err, QueueError::UnsupportedLink { .. }), "{input}");
            assert_eq!(err.link(), Some(input));
        }
    }

    #[test]
    fn keeps_trimmed_input() {
        let p = parse_link("  https://www.deezer.com/track/1  ").unwrap();
        assert_eq!(p.link, "https://www.deezer.com/track/1");
    }
}
