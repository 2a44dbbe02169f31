use std::io::Read as _;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::foundation::error::{ReelError, ReelResult};

/// Raster formats the composition filtergraph accepts as stills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// JPEG / JFIF.
    Jpeg,
    /// PNG.
    Png,
    /// WebP (lossy or lossless).
    WebP,
}

/// A still image that passed signature and header validation.
///
/// The engine only references the file; it is never copied or modified.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MediaAsset {
    /// Position in the caller's image list.
    pub source_index: usize,
    /// Path on disk.
    pub path: PathBuf,
    /// Format detected from the file content.
    pub kind: ImageKind,
    /// Pixel width from the image header.
    pub width: u32,
    /// Pixel height from the image header.
    pub height: u32,
}

/// An input image dropped from the plan.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AssetRejection {
    /// Position in the caller's image list.
    pub source_index: usize,
    /// Path on disk.
    pub path: PathBuf,
    /// Why the image was dropped.
    pub reason: String,
}

impl AssetRejection {
    /// Convert into the matching [`ReelError::AssetRejected`].
    pub fn to_error(&self) -> ReelError {
        ReelError::asset_rejected(&self.path, &self.reason)
    }
}

/// Outcome of validating the caller's image list.
#[derive(Clone, Debug, Default)]
pub struct ValidatedAssets {
    /// Usable stills, in caller order.
    pub assets: Vec<MediaAsset>,
    /// Dropped inputs, in caller order.
    pub rejected: Vec<AssetRejection>,
}

// Enough for every supported signature (WebP needs 12 bytes).
const SNIFF_LEN: u64 = 32;

/// Identify a still by its leading bytes and read its dimensions from the header.
///
/// The file extension is never consulted.
pub fn sniff_image(source_index: usize, path: &Path) -> Result<MediaAsset, AssetRejection> {
    let reject = |reason: String| AssetRejection {
        source_index,
        path: path.to_path_buf(),
        reason,
    };

    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    std::fs::File::open(path)
        .and_then(|f| f.take(SNIFF_LEN).read_to_end(&mut head))
        .map_err(|e| reject(format!("cannot read file: {e}")))?;
    if head.is_empty() {
        return Err(reject("file is empty".to_owned()));
    }

    let format = image::guess_format(&head)
        .map_err(|_| reject("no recognizable image signature".to_owned()))?;
    let kind = match format {
        image::ImageFormat::Jpeg => ImageKind::Jpeg,
        image::ImageFormat::Png => ImageKind::Png,
        image::ImageFormat::WebP => ImageKind::WebP,
        other => return Err(reject(format!("unsupported image format {other:?}"))),
    };

    let (width, height) = image::ImageReader::open(path)
        .map_err(|e| reject(format!("cannot open image: {e}")))?
        .with_guessed_format()
        .map_err(|e| reject(format!("cannot read image header: {e}")))?
        .into_dimensions()
        .map_err(|e| reject(format!("corrupt image header: {e}")))?;
    if width == 0 || height == 0 {
        return Err(reject(format!("degenerate dimensions {width}x{height}")));
    }

    Ok(MediaAsset {
        source_index,
        path: path.to_path_buf(),
        kind,
        width,
        height,
    })
}

/// Validate every input image, dropping the ones that fail.
///
/// Fails with [`ReelError::NoUsableAssets`] when nothing survives.
#[tracing::instrument(skip(paths), fields(inputs = paths.len()))]
pub fn validate_assets(paths: &[PathBuf]) -> ReelResult<ValidatedAssets> {
    let results: Vec<_> = paths
        .par_iter()
        .enumerate()
        .map(|(i, p)| sniff_image(i, p))
        .collect();

    let mut out = ValidatedAssets::default();
    for r in results {
        match r {
            Ok(asset) => out.assets.push(asset),
            Err(rejection) => {
                tracing::warn!(
                    path = %rejection.path.display(),
                    reason = %rejection.reason,
                    "dropping invalid image"
                );
                out.rejected.push(rejection);
            }
        }
    }

    if out.assets.is_empty() {
        return Err(ReelError::NoUsableAssets);
    }
    tracing::debug!(
        usable = out.assets.len(),
        rejected = out.rejected.len(),
        "asset validation done"
    );
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/sniff.rs"]
mod tests;
