//! The production, single-attempt fetcher.
//!
//! The getter understands go-getter style sources: a forcing prefix selects
//! the protocol, otherwise it is detected from the address. `//subdir` and
//! `?ref=` suffixes are honoured for version-control protocols.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::Fetcher;
use crate::error::{Error, Result};
use crate::filesystem;
use crate::git;
use crate::settings::FetchSettings;
use crate::source::{human_readable, split_forced, Address};

/// Hosts whose `host/org/repo` shorthand means a git repository over HTTPS.
const GIT_FORGES: [&str; 3] = ["github.com/", "gitlab.com/", "bitbucket.org/"];

/// The protocols the getter knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Git,
    File,
    Http,
    S3,
    Gcs,
    Mercurial,
}

impl Protocol {
    /// Maps a forcing prefix (without `::`) to a protocol.
    pub fn from_forced(name: &str) -> Option<Self> {
        match name {
            "git" => Some(Protocol::Git),
            "file" => Some(Protocol::File),
            "http" | "https" => Some(Protocol::Http),
            "s3" => Some(Protocol::S3),
            "gcs" => Some(Protocol::Gcs),
            "hg" | "mercurial" => Some(Protocol::Mercurial),
            _ => None,
        }
    }

    /// Infers the protocol of an address without a forcing prefix.
    pub fn detect(location: &str) -> Option<Self> {
        if Path::new(location).exists() {
            return Some(Protocol::File);
        }
        if location.starts_with("git@") || location.ends_with(".git") {
            return Some(Protocol::Git);
        }
        let without_scheme = location
            .strip_prefix("https://")
            .or_else(|| location.strip_prefix("http://"))
            .unwrap_or(location);
        if GIT_FORGES.iter().any(|forge| without_scheme.starts_with(forge)) {
            return Some(Protocol::Git);
        }
        if location.starts_with("s3://") || location.contains(".amazonaws.com/") {
            return Some(Protocol::S3);
        }
        if location.starts_with("gs://") || location.contains("storage.googleapis.com/") {
            return Some(Protocol::Gcs);
        }
        if location.starts_with("http://") || location.starts_with("https://") {
            return Some(Protocol::Http);
        }
        None
    }
}

/// Expands forge shorthands (`github.com/org/repo`) into HTTPS URLs.
fn git_url(location: &str) -> String {
    if GIT_FORGES.iter().any(|forge| location.starts_with(forge)) {
        format!("https://{}", location)
    } else {
        location.to_string()
    }
}

/// Fetches a source with exactly one protocol.
pub struct Getter {
    settings: FetchSettings,
    http: reqwest::blocking::Client,
}

impl Getter {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.timeout)
            .build()?;
        Ok(Self { settings, http })
    }

    fn fetch_vcs(&self, protocol: Protocol, src: &str, address: &Address, dst: &Path) -> Result<()> {
        let staging = filesystem::staging_dir_for(dst, ".furyctl-clone-")?;
        let checkout = staging.path().join("checkout");
        let timeout = self.settings.timeout;

        match protocol {
            Protocol::Mercurial => git::hg_clone(
                &address.location,
                address.reference.as_deref(),
                &checkout,
                timeout,
            )?,
            _ => git::clone(
                &git_url(&address.location),
                address.reference.as_deref(),
                &checkout,
                timeout,
            )?,
        }

        let content = match &address.subdir {
            Some(subdir) => {
                let path = checkout.join(subdir);
                if !path.exists() {
                    return Err(Error::Download {
                        src: human_readable(src),
                        message: format!("subdirectory '{}' not found in repository", subdir),
                    });
                }
                path
            }
            None => checkout,
        };

        filesystem::replace_dir(&content, dst)
    }

    fn fetch_file(&self, src: &str, address: &Address, dst: &Path) -> Result<()> {
        let location = address
            .location
            .strip_prefix("file://")
            .unwrap_or(&address.location);
        let mut path = PathBuf::from(location);
        if let Some(subdir) = &address.subdir {
            path.push(subdir);
        }
        if !path.exists() {
            return Err(Error::Download {
                src: human_readable(src),
                message: format!("{} does not exist", path.display()),
            });
        }

        let staging = filesystem::staging_dir_for(dst, ".furyctl-copy-")?;
        let content = staging.path().join("content");
        filesystem::copy_tree(&path, &content)?;
        filesystem::replace_dir(&content, dst)
    }

    fn fetch_http(&self, src: &str, address: &Address, dst: &Path) -> Result<()> {
        let url = url::Url::parse(&address.location)?;
        // reqwest errors render their URL, userinfo included
        let response = self.http.get(url.clone()).send().map_err(reqwest::Error::without_url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Download {
                src: human_readable(src),
                message: format!("GET returned {}", status),
            });
        }

        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("download")
            .to_string();
        let body = response.bytes().map_err(reqwest::Error::without_url)?;

        let staging = filesystem::staging_dir_for(dst, ".furyctl-http-")?;
        let content = staging.path().join("content");
        fs::create_dir_all(&content)?;
        fs::write(content.join(file_name), &body)?;
        filesystem::replace_dir(&content, dst)
    }
}

impl Fetcher for Getter {
    fn download(&self, src: &str, dst: &Path) -> Result<()> {
        let (forced, rest) = split_forced(src);
        let address = Address::parse(rest);

        let display = human_readable(src);

        let protocol = match forced {
            Some(name) => Protocol::from_forced(name).ok_or_else(|| Error::UnsupportedProtocol {
                protocol: name.to_string(),
                src: display.clone(),
            })?,
            None => Protocol::detect(&address.location).ok_or_else(|| Error::Download {
                src: display.clone(),
                message: "cannot detect a protocol for this source".to_string(),
            })?,
        };
        debug!("Fetching {} with {:?} into {}", display, protocol, dst.display());

        match protocol {
            Protocol::Git | Protocol::Mercurial => self.fetch_vcs(protocol, src, &address, dst),
            Protocol::File => self.fetch_file(src, &address, dst),
            Protocol::Http => self.fetch_http(src, &address, dst),
            Protocol::S3 | Protocol::Gcs => Err(Error::UnsupportedProtocol {
                protocol: format!("{:?}", protocol).to_lowercase(),
                src: display,
            }),
        }
    }
}
