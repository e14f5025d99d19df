//! File browsing: directories render as an HTML listing, files go to `ServeDir`.
//! Used by: server.

use std::path::Path;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::error::Error;
use crate::state::AppState;
use crate::storage::{encode_component, resolve_request_path};

const INDEX_FILE: &str = "index.html";

pub async fn browse(State(state): State<AppState>, request: Request) -> Response {
    let root = &state.config.file_dir;
    let uri_path = request.uri().path().to_owned();
    let Some(relative) = resolve_request_path(&uri_path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let dir = root.join(&relative);
    let is_listing = tokio::fs::metadata(&dir).await.is_ok_and(|meta| meta.is_dir())
        && !tokio::fs::try_exists(dir.join(INDEX_FILE)).await.unwrap_or(false);
    if !is_listing {
        return match ServeDir::new(root).oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        };
    }

    if !uri_path.ends_with('/') {
        return Redirect::permanent(&format!("{uri_path}/")).into_response();
    }
    match render_listing(&dir).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "directory listing failed");
            Error::Io(e).into_response()
        }
    }
}

/// Sorted entries, directories suffixed with `/`, as Go-style `<pre>` links.
async fn render_listing(dir: &Path) -> std::io::Result<String> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_dir = entry.file_type().await?.is_dir();
        names.push((name, is_dir));
    }
    names.sort();

    let mut html = String::from("<!DOCTYPE html>\n<meta charset=\"utf-8\">\n<pre>\n");
    for (name, is_dir) in &names {
        let slash = if *is_dir { "/" } else { "" };
        html.push_str(&format!(
            "<a href=\"{}{slash}\">{}{slash}</a>\n",
            encode_component(name),
            escape_html(name)
        ));
    }
    html.push_str("</pre>\n");
    Ok(html)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
