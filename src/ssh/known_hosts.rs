//! known_hosts maintenance
//!
//! Stale entries for a re-deployed node are dropped before its fresh key is
//! appended. Hashed entries (`|1|salt|hash`, written with `HashKnownHosts`)
//! are matched by recomputing the HMAC-SHA1 of each name.

use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::debug;

type HmacSha1 = Hmac<Sha1>;

/// Does a hashed host field (`|1|salt|hash`) hash any of `names`?
fn hashed_field_matches(field: &str, names: &[&str]) -> bool {
    let Some((salt, hash)) = field.strip_prefix("|1|").and_then(|rest| rest.split_once('|'))
    else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (STANDARD.decode(salt), STANDARD.decode(hash)) else {
        return false;
    };

    names.iter().any(|name| match HmacSha1::new_from_slice(&salt) {
        Ok(mut mac) => {
            mac.update(name.as_bytes());
            mac.verify_slice(&hash).is_ok()
        }
        Err(_) => false,
    })
}

/// Does a known_hosts host field name any of `names`?
fn host_field_matches(field: &str, names: &[&str]) -> bool {
    if field.starts_with('|') {
        return hashed_field_matches(field, names);
    }
    field.split(',').any(|pattern| {
        let host = pattern
            .strip_prefix('[')
            .and_then(|rest| rest.split_once("]:"))
            .map_or(pattern, |(host, _port)| host);
        names.contains(&host)
    })
}

/// Remove lines for `names`, returning the kept content and the number of
/// dropped lines
pub fn remove_hosts(content: &str, names: &[&str]) -> (String, usize) {
    let mut kept = String::with_capacity(content.len());
    let mut removed = 0;

    for line in content.lines() {
        let trimmed = line.trim_start();
        let field = trimmed.split_whitespace().next().unwrap_or("");
        let is_entry = !trimmed.is_empty() && !trimmed.starts_with('#');
        // `@cert-authority`/`@revoked` markers precede the host field
        let field = if field.starts_with('@') {
            trimmed.split_whitespace().nth(1).unwrap_or("")
        } else {
            field
        };

        if is_entry && host_field_matches(field, names) {
            removed += 1;
            continue;
        }
        kept.push_str(line);
        kept.push('\n');
    }

    (kept, removed)
}

/// Replace every known_hosts entry for `hostname` and `ips`.
///
/// With a key, one `hostname,ip key` line is appended per IP. Without one
/// the stale entries are only removed. A missing file is treated as empty.
pub async fn update_known_hosts(
    path: &Path,
    hostname: &str,
    ips: &[String],
    key: Option<&str>,
) -> Result<()> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let mut names: Vec<&str> = vec![hostname];
    names.extend(ips.iter().map(String::as_str));
    let (mut updated, removed) = remove_hosts(&content, &names);

    if let Some(key) = key {
        for ip in ips {
            updated.push_str(&format!("{},{} {}\n", hostname, ip, key));
        }
    }

    debug!(
        path = %path.display(),
        hostname,
        removed,
        added = if key.is_some() { ips.len() } else { 0 },
        "Updated known_hosts"
    );

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, updated).await?;
    Ok(())
}
