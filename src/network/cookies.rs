//! Seeds the shared cookie jar from Netscape cookie files.
//!
//! Browser extensions export this format; dropping a file for a site into the
//! cookies directory lets the client reuse a session solved in a real browser.

use crate::error::CookieError;
use reqwest::Url;
use reqwest::cookie::Jar;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// One line of a Netscape cookie file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NetscapeCookie {
    domain: String,
    include_subdomains: bool,
    path: String,
    secure: bool,
    expires_unix: Option<u64>,
    name: String,
    value: String,
    http_only: bool,
}

impl NetscapeCookie {
    fn is_expired(&self, now_unix: u64) -> bool {
        self.expires_unix.is_some_and(|expires| expires <= now_unix)
    }

    /// Renders the cookie as a `Set-Cookie` style string plus the URL it belongs to.
    fn to_set_cookie(&self) -> Result<(String, Url), CookieError> {
        let host = self.domain.trim_start_matches('.');
        if host.is_empty() {
            return Err(CookieError::InvalidDomain(self.domain.clone()));
        }

        let url = Url::parse(&format!("https://{}/", host))
            .map_err(|_| CookieError::InvalidDomain(self.domain.clone()))?;

        let mut header = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.include_subdomains {
            header.push_str(&format!("; Domain={}", host));
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }

        Ok((header, url))
    }
}

/// Loads every `*.txt` cookie file under `dir` into `jar`.
///
/// Returns the number of cookies added. Expired cookies are skipped.
pub fn load_cookie_directory(dir: &Path, jar: &Jar) -> Result<usize, CookieError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut added = 0;
    for path in cookie_files(dir)? {
        for cookie in parse_netscape_cookie_file(&path)? {
            if cookie.is_expired(now) {
                continue;
            }
            let (header, url) = cookie.to_set_cookie()?;
            jar.add_cookie_str(&header, &url);
            added += 1;
        }
        tracing::debug!(path = %path.display(), "loaded cookie file");
    }

    Ok(added)
}

fn cookie_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(cookie_files(&path)?);
            continue;
        }

        let is_txt = path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        if is_txt {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn parse_netscape_cookie_file(path: &Path) -> Result<Vec<NetscapeCookie>, CookieError> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.strip_prefix("#HttpOnly_") {
            Some(stripped) => Some((true, stripped)),
            None if line.starts_with('#') => None,
            None => Some((false, line)),
        })
        .map(|(http_only, line)| parse_cookie_line(line, http_only))
        .collect()
}

fn parse_cookie_line(line: &str, http_only: bool) -> Result<NetscapeCookie, CookieError> {
    let fields: Vec<&str> = line.splitn(7, '\t').collect();
    let &[domain, include_subdomains, path, secure, expires, name, value] = fields.as_slice() else {
        return Err(CookieError::InvalidLine(line.to_string()));
    };

    Ok(NetscapeCookie {
        domain: domain.to_string(),
        include_subdomains: include_subdomains.eq_ignore_ascii_case("true"),
        path: path.to_string(),
        secure: secure.eq_ignore_ascii_case("true"),
        expires_unix: expires.parse::<u64>().ok().filter(|ts| *ts != 0),
        name: name.to_string(),
        value: value.to_string(),
        http_only,
    })
}
