//! Upload form and streaming multipart upload into dated directories.
//! Used by: server.

use std::net::SocketAddr;
use std::path::Path;

use axum::extract::multipart::Field;
use axum::extract::{ConnectInfo, Multipart, State};
use axum::response::Html;
use chrono::Local;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::state::AppState;
use crate::storage::UploadTarget;

pub const UPLOAD_FIELD: &str = "uploadFile";
const TEMPLATE_NAME: &str = "upload.html";

const DEFAULT_FORM: &str = r#"<!DOCTYPE html>
<html>
<head><title>Upload file</title></head>
<body>
<form enctype="multipart/form-data" action="/upload" method="post">
  <input type="file" name="uploadFile" />
  <input type="submit" value="Upload" />
</form>
</body>
</html>
"#;

/// Serves `{template_dir}/upload.html`, or a built-in form when it is missing.
pub async fn form(State(state): State<AppState>) -> Html<String> {
    let path = state.config.template_dir.join(TEMPLATE_NAME);
    match tokio::fs::read_to_string(&path).await {
        Ok(template) => Html(template),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "upload template unavailable, using built-in form");
            Html(DEFAULT_FORM.to_owned())
        }
    }
}

pub async fn upload(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut multipart: Multipart,
) -> Result<String> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let client_name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| Error::Validation("missing file name".into()))?;
        let target = UploadTarget::new(&state.config.file_dir, &client_name, Local::now().naive_local())?;

        tokio::fs::create_dir_all(target.dir()).await?;
        let size = match write_field(&mut field, target.path()).await {
            Ok(size) => size,
            Err(e) => {
                discard_partial(target.path()).await;
                tracing::warn!(%peer, path = target.public_path(), error = %e, "upload aborted");
                return Err(e);
            }
        };

        state.metrics.record_upload();
        tracing::info!(%peer, path = target.public_path(), size, "upload finished");
        return Ok(format!("Upload finished, file's address: {}\n", target.public_path()));
    }
    Err(Error::Validation(format!("missing {UPLOAD_FIELD} field")))
}

async fn write_field(field: &mut Field<'_>, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(size)
}

/// Removes a truncated upload so the file root never serves partial content.
async fn discard_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial upload");
        }
    }
}
