//! Location strings naming a local object stream.
//!
//! Accepted forms:
//!
//! ```text
//! relative.json
//! /absolute/path/file.jstream
//! file:relative.json
//! file:///absolute/path/file.jstream
//! not-truly-json.json?fmt=jstream
//! ```
//!
//! A missing scheme is normalized to `file:`. Any number of leading slashes
//! after the scheme name the same absolute path. Only the `fmt` query key is
//! interpreted; others are kept but ignored.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::{StreamError, StreamResult};

/// The only scheme this crate opens.
pub const FILE_SCHEME: &str = "file";

/// Query key that overrides the path's extension.
pub const FORMAT_KEY: &str = "fmt";

/// How records are packed into the byte stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Framing {
    /// All records are elements of one JSON array (`json`).
    #[serde(rename = "json")]
    Array,
    /// Records are concatenated JSON values (`jstream`).
    #[serde(rename = "jstream")]
    Concatenated,
}

impl Framing {
    /// Token used in extensions and `fmt` query values.
    pub fn token(self) -> &'static str {
        match self {
            Self::Array => "json",
            Self::Concatenated => "jstream",
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Array),
            "jstream" => Ok(Self::Concatenated),
            other => Err(format!("unknown format: {other}")),
        }
    }
}

/// A parsed location string. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    uri: String,
    scheme: String,
    path: String,
    query: Vec<(String, String)>,
}

impl Location {
    /// Parse and normalize a location string.
    ///
    /// Fails with [`StreamError::UnsupportedUri`] for a foreign scheme, an
    /// empty path, or an undecodable query value.
    pub fn parse(input: &str) -> StreamResult<Self> {
        let without_fragment = match input.find('#') {
            Some(i) => &input[..i],
            None => input,
        };
        let (target, raw_query) = match without_fragment.find('?') {
            Some(i) => (&without_fragment[..i], Some(&without_fragment[i + 1..])),
            None => (without_fragment, None),
        };

        let (scheme, rest, uri) = match split_scheme(target) {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest, input.to_string()),
            None if target.starts_with('/') => {
                (FILE_SCHEME.to_string(), target, format!("file://{input}"))
            }
            None => (FILE_SCHEME.to_string(), target, format!("file:{input}")),
        };

        if scheme != FILE_SCHEME {
            return Err(StreamError::unsupported(uri, format!("unknown scheme: {scheme}")));
        }

        let path = if rest.starts_with('/') {
            format!("/{}", rest.trim_start_matches('/'))
        } else {
            rest.to_string()
        };
        if path.is_empty() {
            return Err(StreamError::unsupported(uri, "no path"));
        }

        let query = raw_query.map(parse_query).unwrap_or_default();

        Ok(Self {
            uri,
            scheme,
            path,
            query,
        })
    }

    /// The normalized location, always carrying a scheme.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Filesystem path, relative or absolute.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded query parameters in order of appearance.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Last value given for `key`, if any.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The format token: a non-empty `fmt` parameter, else the extension.
    pub fn format_token(&self) -> Option<&str> {
        self.param(FORMAT_KEY)
            .filter(|v| !v.is_empty())
            .or_else(|| Path::new(&self.path).extension().and_then(|e| e.to_str()))
            .filter(|v| !v.is_empty())
    }

    /// Resolve the framing named by this location.
    pub fn framing(&self) -> StreamResult<Framing> {
        let token = self
            .format_token()
            .ok_or_else(|| StreamError::unsupported(&self.uri, "no format found"))?;
        token
            .parse()
            .map_err(|reason| StreamError::unsupported(&self.uri, reason))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl FromStr for Location {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split `scheme:rest` when the prefix is a valid URI scheme.
///
/// Single-letter prefixes are not schemes so that `C:\x.json` stays a path.
fn split_scheme(target: &str) -> Option<(&str, &str)> {
    let colon = target.find(':')?;
    let scheme = &target[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if scheme.len() < 2 || !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some((scheme, &target[colon + 1..]))
}

/// Form-decode `raw`: `+` is a space, `%XX` is a byte, bad UTF-8 is replaced.
fn parse_query(raw: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_relative_path_gets_scheme() {
        let loc = Location::parse("data.json").unwrap();
        assert_eq!(loc.uri(), "file:data.json");
        assert_eq!(loc.scheme(), "file");
        assert_eq!(loc.path(), "data.json");
        assert_eq!(loc.framing().unwrap(), Framing::Array);
    }

    #[test]
    fn bare_absolute_path_gets_triple_slash() {
        let loc = Location::parse("/dev/stdin?fmt=jstream&another=42").unwrap();
        assert_eq!(loc.uri(), "file:///dev/stdin?fmt=jstream&another=42");
        assert_eq!(loc.path(), "/dev/stdin");
        assert_eq!(loc.framing().unwrap(), Framing::Concatenated);
    }

    #[test]
    fn query_overrides_extension() {
        let loc = Location::parse("data.json?fmt=jstream").unwrap();
        assert_eq!(loc.format_token(), Some("jstream"));
        assert_eq!(loc.framing().unwrap(), Framing::Concatenated);
    }

    #[test]
    fn leading_slashes_collapse() {
        for uri in ["file:/three.json", "file:///three.json", "file:////three.json"] {
            let loc = Location::parse(uri).unwrap();
            assert_eq!(loc.path(), "/three.json", "{uri}");
        }
    }

    #[test]
    fn explicit_relative_scheme() {
        let loc = Location::parse("file:relative-with-param.json?fmt=jstream&another=42").unwrap();
        assert_eq!(loc.path(), "relative-with-param.json");
        assert_eq!(loc.param("another"), Some("42"));
        assert_eq!(loc.query().len(), 2);
    }

    #[test]
    fn network_scheme_rejected() {
        let err = Location::parse("http://example.com:4321/path.json?foo=bar").unwrap_err();
        assert!(matches!(err, StreamError::UnsupportedUri { .. }));
    }

    #[test]
    fn empty_path_rejected() {
        for uri in ["file:", "file:?fmt=json", ""] {
            let err = Location::parse(uri).unwrap_err();
            assert!(matches!(err, StreamError::UnsupportedUri { .. }), "{uri}");
        }
    }

    #[test]
    fn missing_format_rejected() {
        let loc = Location::parse("/dev/stdin").unwrap();
        assert_eq!(loc.format_token(), None);
        assert!(matches!(loc.framing().unwrap_err(), StreamError::UnsupportedUri { .. }));
    }

    #[test]
    fn unknown_format_rejected() {
        let loc = Location::parse("commands.yaml").unwrap();
        assert!(matches!(loc.framing().unwrap_err(), StreamError::UnsupportedUri { .. }));
        let loc = Location::parse("commands.json?fmt=xml").unwrap();
        assert!(matches!(loc.framing().unwrap_err(), StreamError::UnsupportedUri { .. }));
    }

    #[test]
    fn empty_fmt_falls_back_to_extension() {
        let loc = Location::parse("commands.jstream?fmt=").unwrap();
        assert_eq!(loc.framing().unwrap(), Framing::Concatenated);
    }

    #[test]
    fn last_fmt_wins_and_values_decode() {
        let loc = Location::parse("x.txt?fmt=json&fmt=jstream&note=a%20b#frag").unwrap();
        assert_eq!(loc.framing().unwrap(), Framing::Concatenated);
        assert_eq!(loc.param("note"), Some("a b"));
    }

    #[test]
    fn query_plus_is_a_space() {
        let loc = Location::parse("cmds.json?note=start+now&tag=a%2Bb&flag").unwrap();
        assert_eq!(loc.param("note"), Some("start now"));
        assert_eq!(loc.param("tag"), Some("a+b"));
        assert_eq!(loc.param("flag"), Some(""));
        assert_eq!(loc.framing().unwrap(), Framing::Array);
    }

    #[test]
    fn framing_tokens_roundtrip() {
        for framing in [Framing::Array, Framing::Concatenated] {
            assert_eq!(framing.to_string().parse::<Framing>().unwrap(), framing);
        }
    }
}
