//! Image storage

use super::ApiClients;
use crate::endpoints::{STORAGE_IMAGE, STORAGE_UPLOAD};
use crate::models::UploadedImage;
use crate::{ClientError, ClientResult};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub struct StorageApi<'a, U> {
    clients: &'a ApiClients<U>,
}

impl<'a, U> StorageApi<'a, U>
where
    U: Serialize + DeserializeOwned + 'static,
{
    pub(crate) fn new(clients: &'a ApiClients<U>) -> Self {
        Self { clients }
    }

    /// Upload an image through the multipart client.
    ///
    /// The form carries the bytes in `file` and, when given, the target
    /// folder in `folder`.
    pub async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        folder: Option<&str>,
    ) -> ClientResult<UploadedImage> {
        if bytes.is_empty() {
            return Err(ClientError::invalid_request(format!(
                "{} is empty",
                file_name
            )));
        }

        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(image_mime(file_name))
            .map_err(|e| ClientError::invalid_request(format!("bad mime type: {}", e)))?;

        let mut form = Form::new().part("file", part);
        if let Some(folder) = folder.filter(|f| !f.is_empty()) {
            form = form.text("folder", folder.to_string());
        }

        let path = self.clients.paths().resolve(&STORAGE_UPLOAD, &[])?;
        let uploaded: UploadedImage = self
            .clients
            .multipart_client()
            .post_multipart(&path, form)
            .await?;

        info!(file_name, size, url = %uploaded.url, "Image uploaded");
        Ok(uploaded)
    }

    /// Read a file from disk and upload it
    pub async fn upload_file(
        &self,
        path: &Path,
        folder: Option<&str>,
    ) -> ClientResult<UploadedImage> {
        let bytes = std::fs::read(path).map_err(nutriadmin_core::NutriError::from)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClientError::invalid_request("path has no file name"))?;
        self.upload_image(file_name, bytes, folder).await
    }

    pub async fn delete_image(&self, id: &str) -> ClientResult<()> {
        let path = self.clients.paths().resolve(&STORAGE_IMAGE, &[id])?;
        self.clients.json_client().delete(&path).await?;
        info!(id, "Image deleted");
        Ok(())
    }
}

/// Content type from the file extension
fn image_mime(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime("whey.PNG"), "image/png");
        assert_eq!(image_mime("banner.jpeg"), "image/jpeg");
        assert_eq!(image_mime("README"), "application/octet-stream");
    }
}
