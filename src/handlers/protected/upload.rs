// handlers/protected/upload.rs - POST /upload handler

use axum::extract::{multipart::MultipartRejection, Extension, Multipart, State};

use crate::auth::AdminPrincipal;
use crate::media::IncomingFile;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::MediaItem;
use crate::state::AppState;

/// POST /upload - Store one media file
///
/// Multipart fields:
/// - `file`: the binary (must carry a filename)
/// - `description`: optional text, defaults to `""`
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "media": {
///     "filename": "1714564800000_cat.png",
///     "originalName": "cat.png",
///     "type": "image",
///     "description": "",
///     "url": "http://localhost:5000/uploads/1714564800000_cat.png",
///     "date": "2024-05-01T12:00:00.000Z"
///   }
/// }
/// ```
pub async fn upload_post(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<MediaItem> {
    let mut multipart = multipart?;

    let mut file = None;
    let mut description = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            // A `file` part without a filename is a plain text field, not an upload
            Some("file") if field.file_name().is_some() && file.is_none() => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                file = Some(IncomingFile {
                    bytes: bytes.to_vec(),
                    original_name,
                    content_type,
                });
            }
            Some("description") if description.is_none() => {
                description = Some(field.text().await?);
            }
            _ => {}
        }
    }

    let item = state.media.receive(file, description).await?;
    tracing::debug!(username = %principal.username, filename = %item.filename, "upload accepted");

    Ok(ApiResponse::success("media", item))
}
