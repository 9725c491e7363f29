//! Source strings and their protocol prefixes.
//!
//! A source is a go-getter style address: an optional forcing prefix
//! (`git::`, `file::`, ...), a location, an optional `//subdir` and an optional
//! query string carrying `ref=`. This module splits those pieces apart without
//! touching the network.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

fn userinfo_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"([A-Za-z][A-Za-z0-9+.-]*://)[^/@\s'"]+@"#).expect("static regex is valid"))
}

fn forced_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z0-9]+)::(.*)$").expect("static regex is valid"))
}

/// A location identifying a remote or local artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source(String);

impl Source {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The forcing protocol, without the `::` separator (`git` for `git::...`).
    pub fn protocol(&self) -> Option<&str> {
        split_forced(&self.0).0
    }

    /// The source with any forcing prefix removed.
    pub fn address(&self) -> &str {
        split_forced(&self.0).1
    }

    /// Returns the allow-list entry (e.g. `"git::"`) this source is forced
    /// with, if any. The empty allow-list entry never matches.
    pub fn known_prefix<'a, S: AsRef<str>>(&self, allowed: &'a [S]) -> Option<&'a str> {
        let protocol = self.protocol()?;
        allowed
            .iter()
            .map(AsRef::as_ref)
            .filter(|p| !p.is_empty())
            .find(|p| p.trim_end_matches("::") == protocol)
    }

    /// Prepends `prefix` to the raw source.
    pub fn with_prefix(&self, prefix: &str) -> Source {
        Source(format!("{}{}", prefix, self.0))
    }

    /// The protocol-independent form used to key the cache.
    pub fn normalized(&self) -> &str {
        self.address()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Source {
    fn from(raw: &str) -> Self {
        Source::new(raw)
    }
}

impl From<String> for Source {
    fn from(raw: String) -> Self {
        Source::new(raw)
    }
}

/// Splits a leading `proto::` forcing prefix from a source string.
pub fn split_forced(src: &str) -> (Option<&str>, &str) {
    match forced_prefix_regex().captures(src) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(proto), Some(rest)) => (Some(proto.as_str()), rest.as_str()),
            _ => (None, src),
        },
        None => (None, src),
    }
}

/// A source address broken into location, sub-directory and reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// The location to fetch, without subdir or query.
    pub location: String,
    /// Path inside the fetched tree to keep (`//subdir`).
    pub subdir: Option<String>,
    /// Revision to check out (`?ref=`).
    pub reference: Option<String>,
}

impl Address {
    /// Parses an address that has already had its forcing prefix removed.
    pub fn parse(address: &str) -> Self {
        let (without_query, query) = match address.split_once('?') {
            Some((head, query)) => (head, Some(query)),
            None => (address, None),
        };

        let reference = query.and_then(|q| {
            q.split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == "ref")
                .map(|(_, value)| value.to_string())
        });

        // `//` inside the scheme separator is not a subdir marker.
        let search_from = without_query.find("://").map(|i| i + 3).unwrap_or(0);
        let (location, subdir) = match without_query[search_from..].find("//") {
            Some(offset) => {
                let split = search_from + offset;
                let subdir = without_query[split + 2..].trim_matches('/');
                (
                    without_query[..split].to_string(),
                    (!subdir.is_empty()).then(|| subdir.to_string()),
                )
            }
            None => (without_query.to_string(), None),
        };

        Self {
            location,
            subdir,
            reference,
        }
    }
}

/// Embeds a credential into an HTTPS git source.
///
/// `git::https://github.com/org/repo` becomes
/// `git::https://oauth2:<token>@github.com/org/repo`. Non-HTTPS sources are
/// returned untouched.
pub fn with_token(src: &str, token: &str) -> String {
    let (protocol, address) = split_forced(src);
    match address.strip_prefix("https://") {
        Some(rest) => {
            let prefix = protocol.map(|p| format!("{}::", p)).unwrap_or_default();
            format!("{}https://oauth2:{}@{}", prefix, token, rest)
        }
        None => src.to_string(),
    }
}

/// Removes any embedded credential and forcing prefix, for display.
pub fn human_readable(src: &str) -> String {
    let address = Address::parse(split_forced(src).1);
    let location = match address.location.split_once("://") {
        Some((scheme, rest)) => match rest.split_once('@') {
            Some((userinfo, host)) if !userinfo.contains('/') => format!("{}://{}", scheme, host),
            _ => address.location.clone(),
        },
        None => address.location.clone(),
    };
    location.trim_end_matches(".git").to_string()
}

/// Drops the userinfo of every URL found in free-form text, such as the
/// stderr of a clone.
pub fn redact_credentials(text: &str) -> String {
    userinfo_regex().replace_all(text, "$1").into_owned()
}
