use crate::error::MediaError;

/// Movie header record tag.
pub const MOVIE_HEADER_MARKER: &[u8; 4] = b"mvhd";

/// Distance from the start of the marker to the time-scale field.
const TIME_SCALE_OFFSET: usize = 17;

/// Time scale followed by duration, both u32.
const FIELDS_LEN: usize = 8;

fn find_marker(blob: &[u8]) -> Option<usize> {
    blob.windows(MOVIE_HEADER_MARKER.len())
        .position(|window| window == MOVIE_HEADER_MARKER)
}

fn read_u32_be(blob: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        blob[offset],
        blob[offset + 1],
        blob[offset + 2],
        blob[offset + 3],
    ])
}

/// Read a clip's duration in seconds from the first `mvhd` record in `blob`.
///
/// The result is truncated (not rounded) to millisecond resolution. Only the
/// 32-bit field layout is understood; 64-bit headers are misread.
pub fn read_duration(blob: &[u8]) -> Result<f64, MediaError> {
    let marker = find_marker(blob).ok_or(MediaError::MarkerNotFound)?;
    let start = marker + TIME_SCALE_OFFSET;

    if start + FIELDS_LEN > blob.len() {
        return Err(MediaError::TruncatedData {
            offset: start,
            needed: FIELDS_LEN,
            available: blob.len().saturating_sub(start),
        });
    }

    let time_scale = read_u32_be(blob, start);
    let duration = read_u32_be(blob, start + 4);

    if time_scale == 0 {
        return Err(MediaError::DivisionByZero);
    }

    let seconds = ((duration as f64 / time_scale as f64) * 1000.0).floor() / 1000.0;
    tracing::debug!(
        "mvhd at offset {}: time scale {}, duration {} -> {}s",
        marker,
        time_scale,
        duration,
        seconds
    );
    Ok(seconds)
}
