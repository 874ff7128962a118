//! Reading request documents and writing results.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

/// Load JSON from a local path or an `http(s)://` URL.
pub fn load_json(location: &str) -> Result<Value> {
    if location.starts_with("http://") || location.starts_with("https://") {
        tracing::info!(url = location, "fetching input");
        let response = ureq::get(location)
            .call()
            .with_context(|| format!("fetching {location}"))?;
        return response
            .into_json()
            .with_context(|| format!("parsing JSON from {location}"));
    }
    let text = fs::read_to_string(location).with_context(|| format!("reading {location}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {location}"))
}

/// Pretty-print `value` to `path`, or to stdout when no path is given.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match path {
        Some(p) => {
            if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(p, text).with_context(|| format!("writing {}", p.display()))?;
            tracing::info!(path = %p.display(), "wrote output");
        }
        None => println!("{text}"),
    }
    Ok(())
}
