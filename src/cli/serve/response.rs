//! HTTP response handlers.

use anyhow::{Context, Result, anyhow};
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response};

use crate::utils::mime;

/// Respond with a file from the mirror.
///
/// Mirrored content is served verbatim; injection already happened on the
/// mirror side.
pub fn respond_file(request: Request, path: &Path, cache_control: &str) -> Result<()> {
    let content_type = mime::from_path(path);

    if *request.method() == Method::Head {
        let response = Response::empty(200)
            .with_header(content_type_header(content_type))
            .with_header(cache_header(cache_control)?);
        request.respond(response)?;
        return Ok(());
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let response = Response::from_data(body)
        .with_header(content_type_header(content_type))
        .with_header(cache_header(cache_control)?);
    request.respond(response)?;
    Ok(())
}

/// Plain 404 response.
pub fn respond_not_found(request: Request) -> Result<()> {
    let response = Response::from_string("404 - not found")
        .with_status_code(404)
        .with_header(content_type_header(mime::types::PLAIN));
    request.respond(response)?;
    Ok(())
}

fn content_type_header(content_type: &str) -> Header {
    // static mime strings are always valid header bytes
    Header::from_bytes("Content-Type", content_type).unwrap()
}

fn cache_header(cache_control: &str) -> Result<Header> {
    Header::from_bytes("Cache-Control", cache_control)
        .map_err(|_| anyhow!("invalid cache-control value: '{cache_control}'"))
}
