//! Generated names for stored uploads
//!
//! Names combine a random alphanumeric prefix with the current Unix time in
//! milliseconds so that concurrent uploads never share a key.

use crate::{Error, Result};
use chrono::Utc;
use rand::prelude::*;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub const MAX_RANDOM_LEN: usize = 100;
pub const FILE_NAME_PREFIX_LEN: usize = 10;

fn random_chars(len: usize) -> String {
    let mut rng = thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Draw `len` characters uniformly from `[A-Za-z0-9]`.
pub fn random_string(len: usize) -> Result<String> {
    if len > MAX_RANDOM_LEN {
        return Err(Error::InvalidArgument(format!(
            "Random string length {} exceeds maximum of {}",
            len, MAX_RANDOM_LEN
        )));
    }

    Ok(random_chars(len))
}

/// Build a collision-resistant base name: `{10 random chars}_{unix millis}`.
pub fn generate_file_name() -> Result<String> {
    Ok(format!(
        "{}_{}",
        random_string(FILE_NAME_PREFIX_LEN)?,
        Utc::now().timestamp_millis()
    ))
}

/// Extension declared in an uploaded file name, lowercased.
///
/// Used for naming only; it never influences classification.
pub fn declared_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || stem.is_empty() || ext.contains('/') {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_string_length_and_charset() {
        let s = random_string(32).unwrap();
        assert_eq!(s.len(), 32);
        assert!(s.bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_string_bounds() {
        assert_eq!(random_string(0).unwrap(), "");
        assert_eq!(random_string(MAX_RANDOM_LEN).unwrap().len(), 100);

        let err = random_string(MAX_RANDOM_LEN + 1).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_generated_file_name_shape() {
        let name = generate_file_name().unwrap();
        let (prefix, millis) = name.split_once('_').unwrap();

        assert_eq!(prefix.len(), FILE_NAME_PREFIX_LEN);
        assert!(prefix.bytes().all(|b| b.is_ascii_alphanumeric()));
        assert!(millis.parse::<i64>().unwrap() > 0);
    }

    #[test]
    fn test_generated_file_names_are_unique() {
        let names: HashSet<String> = (0..200).map(|_| generate_file_name().unwrap()).collect();
        assert_eq!(names.len(), 200);
    }

    #[test]
    fn test_declared_extension() {
        assert_eq!(declared_extension("holiday.JPG").as_deref(), Some("jpg"));
        assert_eq!(declared_extension("clip.final.mov").as_deref(), Some("mov"));
        assert_eq!(declared_extension("README"), None);
        assert_eq!(declared_extension("trailing."), None);
        assert_eq!(declared_extension(".hidden"), None);
    }
}
