use std::path::Path;

use anyhow::Context as _;

use crate::assets::sniff::MediaAsset;
use crate::foundation::error::{ReelError, ReelResult};

/// Landscape cover size expected by video platforms.
pub const THUMBNAIL_SIZE: (u32, u32) = (1280, 720);

/// Write a cover-cropped JPEG thumbnail of `asset` to `out`.
pub fn write_thumbnail(asset: &MediaAsset, out: &Path) -> ReelResult<()> {
    let (w, h) = THUMBNAIL_SIZE;
    let img = image::open(&asset.path)
        .with_context(|| format!("decode '{}' for thumbnail", asset.path.display()))?;
    let cover = img
        .resize_to_fill(w, h, image::imageops::FilterType::Triangle)
        .to_rgb8();

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create thumbnail dir '{}'", parent.display()))?;
    }
    cover
        .save_with_format(out, image::ImageFormat::Jpeg)
        .map_err(|e| ReelError::Other(anyhow::anyhow!("write thumbnail '{}': {e}", out.display())))?;
    tracing::debug!(source = %asset.path.display(), out = %out.display(), "wrote thumbnail");
    Ok(())
}
