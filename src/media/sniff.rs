use super::MediaKind;
use crate::error::MediaError;

/// Lowercase hex magic numbers accepted as images.
///
/// `667479706d696631` (`ftyp` + `mif1`, HEIF) shares its layout with the video
/// entries below but is deliberately listed here.
pub const IMAGE_SIGNATURES: &[&str] = &["ffd8ffe0", "89504e47", HEIF_SIGNATURE];

/// Lowercase hex magic numbers accepted as videos.
pub const VIDEO_SIGNATURES: &[&str] = &[
    "6674797071742020",
    "667479706d703432",
    "6674797069736f6d",
    "6674797069736f32",
];

/// Hex signature of the HEIF image brand (`ftypmif1`).
pub const HEIF_SIGNATURE: &str = "667479706d696631";

/// Hex signature of the QuickTime brand (`ftypqt  `).
pub const QUICKTIME_SIGNATURE: &str = "6674797071742020";

const SHORT_WINDOW: usize = 4;
const BOX_WINDOW_START: usize = 4;
const BOX_WINDOW_END: usize = 12;

/// Look up a lowercase hex signature in the static table.
pub fn signature_kind(hex_signature: &str) -> Option<MediaKind> {
    if IMAGE_SIGNATURES.contains(&hex_signature) {
        Some(MediaKind::Image)
    } else if VIDEO_SIGNATURES.contains(&hex_signature) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Hex-encode the window of `blob` that carries its magic number.
///
/// Box-structured containers start with a 4-byte size whose first byte is
/// zero; for those the brand sits at bytes 4..12.
pub fn magic_window(blob: &[u8]) -> Result<String, MediaError> {
    let head = blob.get(..SHORT_WINDOW).ok_or(MediaError::InvalidInput {
        required: SHORT_WINDOW,
        actual: blob.len(),
    })?;

    let window = if head[0] == 0 {
        blob.get(BOX_WINDOW_START..BOX_WINDOW_END)
            .ok_or(MediaError::InvalidInput {
                required: BOX_WINDOW_END,
                actual: blob.len(),
            })?
    } else {
        head
    };

    Ok(hex::encode(window))
}

/// Classify a blob as image, video or unknown from its leading bytes.
pub fn classify(blob: &[u8]) -> Result<MediaKind, MediaError> {
    let signature = magic_window(blob)?;
    let kind = signature_kind(&signature).unwrap_or(MediaKind::Unknown);
    tracing::debug!("Magic number {} classified as {}", signature, kind);
    Ok(kind)
}
