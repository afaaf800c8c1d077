use crate::errors::{ApiError, StoreError};
use crate::types::DocumentId;
use std::path::Path;

/// Accepted photo content types and the extension each is stored under.
const IMAGE_TYPES: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// Validates and writes an uploaded photo, returning the stored file name.
///
/// The write is awaited; success and failure are explicit branches of the
/// returned future rather than a fire-and-forget callback.
pub async fn save_photo(
    dir: &Path,
    id: DocumentId,
    content_type: Option<&str>,
    bytes: &[u8],
    max_bytes: u64,
) -> Result<String, ApiError> {
    let ext = content_type
        .and_then(|ct| IMAGE_TYPES.iter().find(|(mime, _)| *mime == ct))
        .map(|(_, ext)| *ext)
        .ok_or_else(|| ApiError::BadRequest("please upload an image file".to_string()))?;

    if bytes.len() as u64 > max_bytes {
        return Err(ApiError::BadRequest(format!(
            "please upload an image of at most {max_bytes} bytes"
        )));
    }

    let file_name = format!("photo_{id}.{ext}");
    tokio::fs::create_dir_all(dir).await.map_err(StoreError::Io)?;
    tokio::fs::write(dir.join(&file_name), bytes).await.map_err(StoreError::Io)?;
    Ok(file_name)
}
