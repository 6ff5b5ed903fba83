//! Repository coordinates from git remote URLs

use crate::error::{Error, Result};
use crate::types::{GitRemote, PlatformConfig};
use regex::Regex;
use std::env;

/// Whether a remote URL points at GitHub (or the `GH_HOST` enterprise host)
pub fn is_github_url(url: &str) -> bool {
    let gh_host = env::var("GH_HOST").ok();
    extract_hostname(url).is_some_and(|hostname| {
        hostname == "github.com"
            || hostname.ends_with(".github.com")
            || gh_host.as_ref().is_some_and(|h| hostname == *h)
    })
}

/// Parse owner/repo from a GitHub remote URL
pub fn parse_repo_info(url: &str) -> Result<PlatformConfig> {
    if !is_github_url(url) {
        return Err(Error::NoSupportedRemotes);
    }
    let hostname = extract_hostname(url);

    // SSH: git@host:owner/repo.git, HTTPS: https://host/owner/repo.git
    let re_ssh = Regex::new(r"^(?:ssh://)?git@[^:/]+[:/](.+?)(?:\.git)?/?$")
        .map_err(|e| Error::Internal(e.to_string()))?;
    let re_https = Regex::new(r"^https?://[^/]+/(.+?)(?:\.git)?/?$")
        .map_err(|e| Error::Internal(e.to_string()))?;

    let path = re_ssh
        .captures(url)
        .or_else(|| re_https.captures(url))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Error::Parse(format!("cannot parse remote URL: {url}")))?;

    let Some((owner, repo)) = path.split_once('/') else {
        return Err(Error::Parse(format!("invalid repo path: {path}")));
    };
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(Error::Parse(format!("invalid repo path: {path}")));
    }

    let host = hostname.filter(|h| h != "github.com");

    Ok(PlatformConfig {
        owner: owner.to_string(),
        repo: repo.to_string(),
        host,
    })
}

/// Resolve repository coordinates from the named remote
pub fn resolve_remote(remotes: &[GitRemote], name: &str) -> Result<PlatformConfig> {
    if remotes.is_empty() {
        return Err(Error::NoSupportedRemotes);
    }
    let remote = remotes
        .iter()
        .find(|r| r.name == name)
        .ok_or_else(|| Error::RemoteNotFound(name.to_string()))?;
    parse_repo_info(&remote.url)
}

fn extract_hostname(url: &str) -> Option<String> {
    if let Some(rest) = url.strip_prefix("git@") {
        return rest.split(':').next().map(ToString::to_string);
    }

    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
}
