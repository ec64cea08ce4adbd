use std::collections::HashMap;
use std::io::Write;

use actix_multipart::Multipart;
use actix_web::error::ErrorBadRequest;
use futures_util::TryStreamExt;
use tempfile::NamedTempFile;
use tracing::debug;

/// A collected multipart upload: the file part spooled to a temp file plus
/// any plain text fields (month, year).
///
/// The temp file is removed when this struct drops, so the "delete the
/// upload whatever happens" contract holds on every exit path.
pub struct UploadForm {
    pub file: NamedTempFile,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Drains a multipart payload into an `UploadForm`. Exactly one file part is
/// expected; later file parts overwrite earlier ones, matching the
/// single-file upload forms of the portal.
pub async fn collect_multipart(mut payload: Multipart) -> actix_web::Result<UploadForm> {
    let mut file: Option<NamedTempFile> = None;
    let mut fields = HashMap::new();

    while let Some(mut part) = payload.try_next().await? {
        let disposition = part.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let is_file = disposition.get_filename().is_some();

        if is_file {
            let mut tmp = NamedTempFile::new()
                .map_err(|e| ErrorBadRequest(format!("Could not buffer upload: {e}")))?;
            let mut written = 0usize;
            while let Some(chunk) = part.try_next().await? {
                written += chunk.len();
                tmp.write_all(&chunk)
                    .map_err(|e| ErrorBadRequest(format!("Could not buffer upload: {e}")))?;
            }
            debug!(field = %name, bytes = written, "Upload part buffered");
            file = Some(tmp);
        } else {
            let mut value = Vec::new();
            while let Some(chunk) = part.try_next().await? {
                value.extend_from_slice(&chunk);
            }
            let value = String::from_utf8(value)
                .map_err(|_| ErrorBadRequest("Form field is not valid UTF-8"))?;
            fields.insert(name, value);
        }
    }

    let file = file.ok_or_else(|| ErrorBadRequest("No file uploaded"))?;
    Ok(UploadForm { file, fields })
}
