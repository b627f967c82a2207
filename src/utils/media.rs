use std::path::PathBuf;

use image::ImageFormat;
use tracing::info;
use uuid::Uuid;

use crate::{Error, Result};

/// Stores uploaded post images under `<root>/posts/`.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Checks that `bytes` decode as an image and writes them to disk.
    /// Returns the path relative to the media root.
    pub async fn save_post_image(&self, bytes: Vec<u8>) -> Result<String> {
        // Decoding is CPU-bound.
        let (bytes, extension) = tokio::task::spawn_blocking(move || {
            let extension = image_extension(&bytes)?;
            Ok::<_, Error>((bytes, extension))
        })
        .await
        .map_err(|e| {
            tracing::error!("Image check task failed: {:?}", e);
            Error::InternalServerError
        })??;

        let name = format!("posts/{}.{}", Uuid::now_v7(), extension);
        let path = self.root.join(&name);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                tracing::error!("Failed to create media directory: {:?}", e);
                Error::InternalServerError
            })?;
        }
        tokio::fs::write(&path, &bytes).await.map_err(|e| {
            tracing::error!("Failed to write {}: {:?}", path.display(), e);
            Error::InternalServerError
        })?;

        info!(path = %name, size = bytes.len(), "Stored post image");
        Ok(name)
    }

    /// Deletes a stored image. Failures are logged, not returned.
    pub async fn remove(&self, name: &str) {
        let path = self.root.join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!(path = %name, "Removed post image"),
            Err(e) => tracing::warn!("Failed to remove {}: {:?}", path.display(), e),
        }
    }
}

/// Sniffs the format and makes sure the payload actually decodes.
pub fn image_extension(bytes: &[u8]) -> Result<&'static str> {
    let format = image::guess_format(bytes).map_err(|e| Error::Image(e.to_string()))?;
    image::load_from_memory_with_format(bytes, format).map_err(|e| Error::Image(e.to_string()))?;

    let extension = match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Bmp => "bmp",
        other => {
            return Err(Error::Image(format!("unsupported format {:?}", other)));
        }
    };
    Ok(extension)
}

#[cfg(test)]
pub(crate) const SMALL_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0xf8,
    0xcf, 0xc0, 0xf0, 0x1f, 0x00, 0x05, 0x00, 0x01, 0xff, 0x89, 0x99, 0x3d, 0x1d, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_a_png() {
        assert_eq!(image_extension(SMALL_PNG).unwrap(), "png");
    }

    #[test]
    fn rejects_text_posing_as_an_image() {
        assert!(matches!(
            image_extension(b"definitely not an image"),
            Err(Error::Image(_))
        ));
    }

    #[tokio::test]
    async fn saves_under_posts_directory() {
        let root = std::env::temp_dir().join(format!("yatube-media-{}", Uuid::now_v7()));
        let storage = MediaStorage::new(&root);

        let name = storage.save_post_image(SMALL_PNG.to_vec()).await.unwrap();

        assert!(name.starts_with("posts/") && name.ends_with(".png"));
        assert!(root.join(&name).exists());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn undecodable_upload_writes_nothing() {
        let root = std::env::temp_dir().join(format!("yatube-media-{}", Uuid::now_v7()));
        let storage = MediaStorage::new(&root);

        let result = storage.save_post_image(b"GIF89a but not really".to_vec()).await;

        assert!(matches!(result, Err(Error::Image(_))));
        assert!(!root.join("posts").exists());
    }

    #[tokio::test]
    async fn remove_deletes_a_stored_image() {
        let root = std::env::temp_dir().join(format!("yatube-media-{}", Uuid::now_v7()));
        let storage = MediaStorage::new(&root);
        let name = storage.save_post_image(SMALL_PNG.to_vec()).await.unwrap();

        storage.remove(&name).await;
        storage.remove(&name).await;

        assert!(!root.join(&name).exists());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
