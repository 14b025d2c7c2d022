use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use uuid::Uuid;

use crate::error::{ApiError, TypeError};

/// Writes decoded base64 image payloads under a media root and hands back
/// the stored relative path.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Decodes a `data:image/...;base64,` payload into
    /// `{root}/{subdir}/{uuid}.{ext}`.
    pub async fn store_image(&self, payload: &str, subdir: &str) -> Result<String, ApiError> {
        let (extension, bytes) = decode_image_payload(payload).map_err(|e| -> ApiError { e.into() })?;

        let name = format!("{}.{}", Uuid::new_v4(), extension);
        let dir = self.root.join(subdir);

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ApiError::InternalServerError(format!("media dir: {e}")))?;
        tokio::fs::write(dir.join(&name), bytes)
            .await
            .map_err(|e| ApiError::InternalServerError(format!("media write: {e}")))?;

        Ok(format!("{subdir}/{name}"))
    }
}

fn decode_image_payload(payload: &str) -> Result<(String, Vec<u8>), TypeError> {
    let rest = payload
        .strip_prefix("data:image/")
        .ok_or(TypeError::new("`image` must be a base64-encoded data url"))?;
    let (format, data) = rest
        .split_once(";base64,")
        .ok_or(TypeError::new("`image` must be a base64-encoded data url"))?;

    if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(TypeError::new("`image` has an unsupported format"));
    }

    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|_e| TypeError::new("`image` payload is not valid base64"))?;
    if bytes.is_empty() {
        return Err(TypeError::new("`image` payload is empty"));
    }

    Ok((format.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_data_url() {
        let (ext, bytes) = decode_image_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(ext, "png");
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn rejects_payloads_without_data_url_framing() {
        assert!(decode_image_payload("aGVsbG8=").is_err());
        assert!(decode_image_payload("data:image/png,aGVsbG8=").is_err());
        assert!(decode_image_payload("data:text/plain;base64,aGVsbG8=").is_err());
    }

    #[test]
    fn rejects_malformed_base64() {
        assert!(decode_image_payload("data:image/png;base64,###").is_err());
        assert!(decode_image_payload("data:image/png;base64,").is_err());
    }
}
