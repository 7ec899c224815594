use image::ImageFormat;
use mediagate::{
    image::{ImageProcessor, MockImageProcessor},
    media::{classify, read_duration, MediaKind},
    models::{Config, UploadRequirements, UploadedFile},
    pipeline::{PipelineServices, UploadPipeline},
    storage::{LocalStorage, MockStorage, StorageService},
    Error, MediaError,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::time::Duration;

fn create_test_png() -> Vec<u8> {
    let img = image::RgbaImage::from_fn(40, 30, |x, y| {
        image::Rgba([(x * 6) as u8, (y * 8) as u8, 128, 255])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// `ftyp` box followed by a `moov` box whose `mvhd` fields sit 17 bytes past
/// the marker, where the duration reader looks for them.
fn create_test_mp4(brand: &[u8; 4], time_scale: u32, duration: u32) -> Vec<u8> {
    let mut blob = Vec::new();
    blob.extend_from_slice(&20u32.to_be_bytes());
    blob.extend_from_slice(b"ftyp");
    blob.extend_from_slice(brand);
    blob.extend_from_slice(&0x200u32.to_be_bytes());
    blob.extend_from_slice(b"isom");

    blob.extend_from_slice(&117u32.to_be_bytes());
    blob.extend_from_slice(b"moov");
    blob.extend_from_slice(&109u32.to_be_bytes());
    blob.extend_from_slice(b"mvhd");
    blob.extend_from_slice(&[0u8; 13]);
    blob.extend_from_slice(&time_scale.to_be_bytes());
    blob.extend_from_slice(&duration.to_be_bytes());
    blob.extend_from_slice(&[0u8; 80]);
    blob
}

#[test]
fn test_core_matches_documented_examples() {
    assert_eq!(
        classify(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap(),
        MediaKind::Image
    );
    assert_eq!(
        classify(&[0x00, 0x00, 0x00, 0x14, 0x66, 0x74, 0x79, 0x70, 0x71, 0x74, 0x20, 0x20])
            .unwrap(),
        MediaKind::Video
    );
    assert_eq!(
        classify(&[0x01, 0x02]),
        Err(MediaError::InvalidInput {
            required: 4,
            actual: 2
        })
    );
}

#[test]
fn test_mp4_duration() {
    let blob = create_test_mp4(b"mp42", 90_000, 450_000);

    assert_eq!(classify(&blob).unwrap(), MediaKind::Video);
    assert_eq!(read_duration(&blob).unwrap(), 5.0);
}

#[test]
fn test_heif_is_classified_as_image() {
    let blob = create_test_mp4(b"mif1", 1, 1);
    assert_eq!(classify(&blob).unwrap(), MediaKind::Image);
}

#[tokio::test]
async fn test_full_workflow_with_local_storage() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("uploads");

    let pipeline = UploadPipeline::with_services(PipelineServices {
        image: Box::new(ImageProcessor::default()),
        storage: Box::new(LocalStorage::new(&root)),
    });

    let files = vec![
        UploadedFile::new("holiday.png", create_test_png(), 0),
        UploadedFile::new("clip.mp4", create_test_mp4(b"isom", 600, 7500), 1),
    ];
    let stored = pipeline
        .handle_files(&files, &UploadRequirements::new("posts"))
        .await
        .unwrap();

    assert_eq!(stored.len(), 2);

    let stored_image = &stored[0];
    assert_eq!(stored_image.kind, MediaKind::Image);
    assert!(stored_image.key.starts_with("posts/"));
    assert!(stored_image.key.ends_with(".jpg"));
    let jpeg = fs::read(root.join(&stored_image.key)).unwrap();
    assert_eq!(&jpeg[..3], &[0xFF, 0xD8, 0xFF]);
    let decoded = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (40, 30));

    let stored_video = &stored[1];
    assert_eq!(stored_video.kind, MediaKind::Video);
    assert_eq!(stored_video.duration_secs, Some(12.5));
    assert!(stored_video.key.ends_with(".mp4"));
    assert_eq!(fs::read(root.join(&stored_video.key)).unwrap(), files[1].data);
}

#[tokio::test]
async fn test_rejected_upload_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("uploads");
    let image = MockImageProcessor::new();
    let image_handle = image.clone();

    let pipeline = UploadPipeline::with_services(PipelineServices {
        image: Box::new(image),
        storage: Box::new(LocalStorage::new(&root)),
    });

    // Declared as a PNG, but the bytes say otherwise.
    let files = vec![UploadedFile::new("avatar.png", b"<svg></svg>".to_vec(), 0)];
    let err = pipeline
        .handle_files(&files, &UploadRequirements::new("avatars"))
        .await
        .unwrap_err();

    assert!(err.is_user_error());
    assert!(matches!(err, Error::InvalidFile { .. }));
    assert_eq!(image_handle.get_convert_count(), 0);
    assert!(!root.exists());
}

#[tokio::test]
async fn test_video_rejected_from_image_only_folder() {
    let storage = MockStorage::new();
    let storage_handle = storage.clone();
    let pipeline = UploadPipeline::with_services(PipelineServices {
        image: Box::new(MockImageProcessor::new()),
        storage: Box::new(storage),
    });

    let requirements =
        UploadRequirements::new("avatars").with_media_kinds(vec![MediaKind::Image]);
    let files = vec![UploadedFile::new(
        "avatar.jpg",
        create_test_mp4(b"qt  ", 600, 600),
        0,
    )];

    let result = pipeline.handle_files(&files, &requirements).await;

    assert!(matches!(result, Err(Error::InvalidFile { .. })));
    assert_eq!(storage_handle.get_write_count(), 0);
}

#[tokio::test]
async fn test_transient_storage_failure_is_retried() {
    let storage = MockStorage::new()
        .with_base_url("https://media.test".to_string())
        .with_failing_writes(1);
    let storage_handle = storage.clone();
    let pipeline = UploadPipeline::with_services(PipelineServices {
        image: Box::new(MockImageProcessor::new()),
        storage: Box::new(storage),
    })
    .with_retry_interval(Duration::from_millis(1));

    let files = vec![UploadedFile::new(
        "clip.mov",
        create_test_mp4(b"qt  ", 600, 900),
        3,
    )];
    let stored = pipeline
        .handle_files(&files, &UploadRequirements::new("clips"))
        .await
        .unwrap();

    assert_eq!(stored[0].id, 3);
    assert_eq!(stored[0].duration_secs, Some(1.5));
    assert!(stored[0].location.starts_with("https://media.test/clips/"));
    assert!(stored[0].location.ends_with(".mov"));
    assert_eq!(storage_handle.get_write_count(), 2);
}

#[tokio::test]
async fn test_remove_stored_file() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path());
    let pipeline = UploadPipeline::with_services(PipelineServices {
        image: Box::new(ImageProcessor::default()),
        storage: Box::new(storage.clone()),
    });

    let files = vec![UploadedFile::new("photo.png", create_test_png(), 0)];
    let stored = pipeline
        .handle_files(&files, &UploadRequirements::new(""))
        .await
        .unwrap();
    assert!(!stored[0].key.contains('/'));
    assert!(storage.file_exists(&stored[0].key).await.unwrap());

    pipeline.remove_file(&stored[0].key).await.unwrap();
    assert!(!storage.file_exists(&stored[0].key).await.unwrap());
}

#[tokio::test]
async fn test_pipeline_from_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("configured");
    let root_str = root.to_string_lossy().to_string();

    let config = Config::from_lookup(|key| match key {
        "UPLOAD_ROOT" => Some(root_str.clone()),
        "JPEG_QUALITY" => Some("40".to_string()),
        _ => None,
    })
    .unwrap();
    let pipeline = UploadPipeline::from_config(&config).await.unwrap();

    let files = vec![UploadedFile::new("photo.png", create_test_png(), 0)];
    let stored = pipeline
        .handle_files(&files, &UploadRequirements::new("posts"))
        .await
        .unwrap();

    assert!(root.join(&stored[0].key).exists());
}

#[tokio::test]
async fn test_heif_upload_rejected_as_user_error() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("uploads");
    let pipeline = UploadPipeline::with_services(PipelineServices {
        image: Box::new(ImageProcessor::default()),
        storage: Box::new(LocalStorage::new(&root)),
    });

    let requirements =
        UploadRequirements::new("avatars").with_media_kinds(vec![MediaKind::Image]);
    let files = vec![UploadedFile::new(
        "portrait.heic",
        create_test_mp4(b"mif1", 1, 1),
        0,
    )];
    let err = pipeline
        .handle_files(&files, &requirements)
        .await
        .unwrap_err();

    assert!(err.is_user_error());
    assert!(matches!(err, Error::InvalidFile { .. }));
    assert!(!root.exists());
}
