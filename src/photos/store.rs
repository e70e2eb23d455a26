//! Saving and deleting profile photos.
//!
//! Uploads are re-encoded as JPEG: a full image bounded to a maximum edge and
//! a square center-cropped thumbnail. Every mutation ends with a full index
//! rebuild.

use std::path::Path;
use std::sync::LazyLock;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use regex::Regex;
use tracing::info;

use super::index::{PhotoEntry, PhotoLibrary, THUMB_SUFFIX};
use crate::error::{Error, Result};

/// Characters not allowed in photo file names.
static RE_FORBIDDEN_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).expect("Invalid regex"));

/// Output sizes for stored photos.
#[derive(Debug, Clone, Copy)]
pub struct PhotoSizes {
    pub thumb_px: u32,
    pub full_max_px: u32,
}

impl Default for PhotoSizes {
    fn default() -> Self {
        Self {
            thumb_px: 300,
            full_max_px: 1600,
        }
    }
}

/// File stem for a profile name: forbidden characters replaced with `_`.
pub fn sanitize_name(name: &str) -> Result<String> {
    let cleaned = RE_FORBIDDEN_CHARS.replace_all(name.trim(), "_").to_string();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        return Err(Error::InvalidProfileName(name.to_string()));
    }
    Ok(cleaned)
}

fn write_jpeg(img: &DynamicImage, path: &Path) -> Result<()> {
    let tmp = path.with_extension("jpg.tmp");
    img.to_rgb8().save_with_format(&tmp, ImageFormat::Jpeg)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Decode `bytes`, store full and thumbnail JPEGs for `name`, rebuild the
/// index and return the new references.
///
/// The name must already be a valid file stem, so the stored files and the
/// catalog row share one key.
pub fn save_photo(
    library: &PhotoLibrary,
    name: &str,
    bytes: &[u8],
    sizes: PhotoSizes,
) -> Result<PhotoEntry> {
    let stem = sanitize_name(name)?;
    if stem != name.trim() {
        return Err(Error::InvalidProfileName(name.to_string()));
    }
    let img = image::load_from_memory(bytes)?;
    library.ensure_dir()?;

    let full = if img.width().max(img.height()) > sizes.full_max_px {
        img.resize(sizes.full_max_px, sizes.full_max_px, FilterType::Lanczos3)
    } else {
        img.clone()
    };
    let thumb = img.resize_to_fill(sizes.thumb_px, sizes.thumb_px, FilterType::Lanczos3);

    write_jpeg(&full, &library.dir().join(format!("{stem}.jpg")))?;
    write_jpeg(&thumb, &library.dir().join(format!("{stem}{THUMB_SUFFIX}.jpg")))?;
    info!(profile = %name, width = full.width(), height = full.height(), "photo saved");

    let index = library.rebuild();
    Ok(index.get(&stem).cloned().unwrap_or_default())
}

/// Remove every stored image for `name`. Returns whether anything was removed.
pub fn delete_photo(library: &PhotoLibrary, name: &str) -> Result<bool> {
    let stem = sanitize_name(name)?;
    let mut removed = false;
    for ext in ["jpg", "jpeg", "png", "webp"] {
        for file in [format!("{stem}.{ext}"), format!("{stem}{THUMB_SUFFIX}.{ext}")] {
            let path = library.dir().join(file);
            if path.is_file() {
                std::fs::remove_file(&path)?;
                removed = true;
            }
        }
    }
    if removed {
        info!(profile = %name, "photo deleted");
    }
    library.rebuild();
    Ok(removed)
}
