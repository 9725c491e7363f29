//! Version-control subprocesses used by the getter.
//!
//! This uses the system `git` (and `hg`) commands, which automatically handle:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers and `NETRC`
//! - Personal access tokens embedded in HTTPS URLs
//! - Any authentication configured in ~/.gitconfig
//!
//! Every command runs under a deadline and is killed when it expires.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use log::debug;
use wait_timeout::ChildExt;

use crate::error::{Error, Result};
use crate::source::{human_readable, redact_credentials};

/// Run `command` to completion within `timeout`, capturing stderr.
pub(crate) fn run_with_timeout(
    mut command: Command,
    description: &str,
    src: &str,
    timeout: Duration,
) -> Result<()> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Command {
            command: description.to_string(),
            src: human_readable(src),
            stderr: e.to_string(),
        })?;

    // Drain stderr off-thread so a chatty child cannot block on a full pipe.
    let stderr_reader = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            buf
        })
    });

    let status = match child.wait_timeout(timeout)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Timeout {
                operation: format!("{} {}", description, human_readable(src)),
                seconds: timeout.as_secs(),
            });
        }
    };

    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    if status.success() {
        return Ok(());
    }

    Err(Error::Command {
        command: description.to_string(),
        src: human_readable(src),
        stderr: explain_auth_failure(&redact_credentials(&stderr)),
    })
}

/// Provide a helpful message for common authentication failures.
fn explain_auth_failure(stderr: &str) -> String {
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        format!(
            "Authentication failed. Make sure you have access to the repository.\n\
            For private repos, ensure you have:\n\
            - SSH key added to ssh-agent\n\
            - FURYCTL_TOKEN set for HTTPS downloads\n\
            Error: {}",
            stderr.trim()
        )
    } else {
        stderr.trim().to_string()
    }
}

fn git() -> Command {
    let mut command = Command::new("git");
    // Never block on an interactive credential prompt.
    command.env("GIT_TERMINAL_PROMPT", "0");
    command
}

/// Clone `url` into `target_dir`, checking out `reference` when given.
///
/// Branches and tags are fetched with a shallow clone. When the shallow clone
/// fails (the reference may be a commit SHA), a full clone followed by a
/// checkout is attempted.
pub fn clone(url: &str, reference: Option<&str>, target_dir: &Path, timeout: Duration) -> Result<()> {
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let Some(reference) = reference else {
        let mut command = git();
        command.args(["clone", "--depth=1", url]).arg(target_dir);
        return run_with_timeout(command, "git clone", url, timeout);
    };

    let mut shallow = git();
    shallow
        .args(["clone", "--depth=1", "--branch", reference, url])
        .arg(target_dir);
    match run_with_timeout(shallow, "git clone", url, timeout) {
        Ok(()) => return Ok(()),
        Err(Error::Timeout { .. }) => {
            return Err(Error::Timeout {
                operation: format!("git clone {}", human_readable(url)),
                seconds: timeout.as_secs(),
            })
        }
        Err(e) => debug!("Shallow clone of {} at {} failed, retrying full clone: {}", human_readable(url), reference, e),
    }

    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }

    let mut full = git();
    full.args(["clone", url]).arg(target_dir);
    run_with_timeout(full, "git clone", url, timeout)?;

    let mut checkout = git();
    checkout
        .arg("-C")
        .arg(target_dir)
        .args(["checkout", reference]);
    run_with_timeout(checkout, "git checkout", url, timeout)
}

/// Clone a Mercurial repository, updating to `reference` when given.
pub fn hg_clone(url: &str, reference: Option<&str>, target_dir: &Path, timeout: Duration) -> Result<()> {
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut command = Command::new("hg");
    command.arg("clone");
    if let Some(reference) = reference {
        command.args(["-u", reference]);
    }
    command.arg(url).arg(target_dir);
    run_with_timeout(command, "hg clone", url, timeout)
}
