use super::classify::{classify, sniff_mime};
use super::location::{parse_url_root, FolderRules, ImageLocation};
use super::rollback::undo_saved_meta;
use crate::auth::{Principal, TokenValidator};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use imagems_core::{AppError, ImageMeta, IngestSettings};
use imagems_db::MetadataStore;
use imagems_storage::FileWriter;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Server time of the call, paired with the public URL of the stored image.
/// The time is reported whether or not the upload succeeded.
pub type IngestResult = (DateTime<Utc>, Result<String, AppError>);

/// Validates, classifies and stores uploaded images.
///
/// Holds no per-call state; concurrent calls only share the injected store,
/// writer and validator. For one call the metadata insert always precedes the
/// file write, and a failed write is compensated by soft-deleting the row
/// before the call returns.
pub struct IngestionEngine {
    validator: Arc<dyn TokenValidator>,
    store: Arc<dyn MetadataStore>,
    writer: Arc<dyn FileWriter>,
    images_dir: PathBuf,
    url_root: Url,
    folders: FolderRules,
}

impl IngestionEngine {
    /// Fails when the images root cannot be created, the URL root is not an
    /// absolute base URL, or the default folder name is unusable.
    pub async fn new(
        settings: &dyn IngestSettings,
        validator: Arc<dyn TokenValidator>,
        store: Arc<dyn MetadataStore>,
        writer: Arc<dyn FileWriter>,
    ) -> Result<Self, AppError> {
        let folders = FolderRules::new(settings.default_folder_name())?;
        let url_root = parse_url_root(settings.img_url_root())?;

        writer
            .create_dir_all(settings.images_dir())
            .await
            .map_err(|e| {
                AppError::Config(format!(
                    "unable to create images dir {}: {}",
                    settings.images_dir().display(),
                    e
                ))
            })?;

        tracing::info!(
            images_dir = %settings.images_dir().display(),
            url_root = %url_root,
            default_folder = %folders.default_folder(),
            "Ingestion engine ready"
        );

        Ok(Self {
            validator,
            store,
            writer,
            images_dir: settings.images_dir().to_path_buf(),
            url_root,
            folders,
        })
    }

    /// Store raw image bytes.
    #[tracing::instrument(
        skip(self, token, data),
        fields(folder = %folder, size_bytes = data.len())
    )]
    pub async fn new_image(&self, token: &str, folder: &str, data: &[u8]) -> IngestResult {
        let now = Utc::now();
        let result = async {
            let principal = self.authorize(token, folder).await?;
            self.save_image(&principal, folder, data).await
        }
        .await;
        (now, result)
    }

    /// Store a base64 encoded image. A `data:<mime>;base64,` prefix and
    /// line-wrapped (MIME style) input are accepted.
    #[tracing::instrument(
        skip(self, token, encoded),
        fields(folder = %folder, encoded_len = encoded.len())
    )]
    pub async fn new_base64_image(
        &self,
        token: &str,
        folder: &str,
        encoded: &str,
    ) -> IngestResult {
        let now = Utc::now();
        let result = async {
            let principal = self.authorize(token, folder).await?;
            let data = decode_base64(encoded)?;
            self.save_image(&principal, folder, &data).await
        }
        .await;
        (now, result)
    }

    /// Token first, then folder syntax. Neither touches the store or the filesystem.
    async fn authorize(&self, token: &str, folder: &str) -> Result<Principal, AppError> {
        let principal = self.validator.validate(token).await?;
        check_user_id(&principal.user_id)?;
        self.folders.validate(folder)?;
        Ok(principal)
    }

    async fn save_image(
        &self,
        principal: &Principal,
        folder: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        if data.is_empty() {
            return Err(AppError::InvalidInput("empty image provided".to_string()));
        }

        let class = classify(data)?;
        let meta = ImageMeta::new(
            principal.user_id.as_str(),
            class.image_type,
            sniff_mime(data),
            class.width,
            class.height,
        );

        let meta_id = self
            .store
            .save_meta(&meta)
            .await
            .map_err(|e| AppError::Database(format!("error saving image metadata: {}", e)))?;

        let file_name = class.image_type.file_name(meta_id);
        let mut segments = vec![principal.user_id.as_str()];
        segments.extend(self.folders.segments(folder));
        segments.push(&file_name);

        match self.write_image(&segments, data).await {
            Ok(url) => {
                tracing::info!(
                    user_id = %principal.user_id,
                    meta_id = meta_id,
                    image_type = %class.image_type,
                    url = %url,
                    "Image stored"
                );
                Ok(url)
            }
            Err(cause) => Err(undo_saved_meta(self.store.as_ref(), meta_id, cause).await),
        }
    }

    async fn write_image(&self, segments: &[&str], data: &[u8]) -> Result<String, AppError> {
        let location = ImageLocation::new(&self.images_dir, &self.url_root, segments)?;

        self.writer
            .create_dir_all(location.dir())
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        self.writer
            .write_file(&location.path, data)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(location.url)
    }
}

/// The user id becomes a directory name, so it must be a single plain path segment.
fn check_user_id(user_id: &str) -> Result<(), AppError> {
    let unusable = user_id.is_empty()
        || user_id == "."
        || user_id == ".."
        || user_id.contains(['/', '\\', '\0']);

    if unusable {
        return Err(AppError::Unauthorized(
            "token carries an unusable user id".to_string(),
        ));
    }
    Ok(())
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, AppError> {
    let trimmed = encoded.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, payload)| payload)
            .ok_or_else(|| AppError::InvalidInput("unsupported data URL".to_string()))?,
        None => trimmed,
    };
    let payload: String = payload
        .chars()
        .filter(|&c| c != '\r' && c != '\n')
        .collect();

    if payload.is_empty() {
        return Err(AppError::InvalidInput("empty image provided".to_string()));
    }

    STANDARD
        .decode(&payload)
        .map_err(|e| AppError::InvalidInput(format!("image is not valid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{fixtures, StaticIngestSettings, StaticTokenValidator};
    use imagems_core::{ErrorKind, ImageType};
    use imagems_db::test_helpers::MockMetadataStore;
    use imagems_storage::test_helpers::MockFileWriter;
    use imagems_storage::LocalFileWriter;
    use std::path::Path;

    const TOKEN: &str = "valid-token";
    const URL_ROOT: &str = "http://localhost:8080/v0/imagems";

    struct Harness {
        engine: IngestionEngine,
        validator: StaticTokenValidator,
        store: MockMetadataStore,
        writer: MockFileWriter,
    }

    async fn harness() -> Harness {
        let validator = StaticTokenValidator::new().with_token(TOKEN, "42");
        let store = MockMetadataStore::new();
        let writer = MockFileWriter::new();
        let engine = IngestionEngine::new(
            &StaticIngestSettings::new("/srv/images"),
            Arc::new(validator.clone()),
            Arc::new(store.clone()),
            Arc::new(writer.clone()),
        )
        .await
        .unwrap();

        Harness {
            engine,
            validator,
            store,
            writer,
        }
    }

    fn kind(result: &Result<String, AppError>) -> ErrorKind {
        result.as_ref().unwrap_err().kind()
    }

    #[tokio::test]
    async fn test_decodable_images_are_stored() {
        let cases = [
            (fixtures::png(10, 20), ImageType::Png, "png"),
            (fixtures::jpeg(16, 8), ImageType::Jpeg, "jpeg"),
            (fixtures::gif(4, 4), ImageType::Gif, "gif"),
        ];

        for (data, image_type, ext) in cases {
            let h = harness().await;
            let (_, result) = h.engine.new_image(TOKEN, "", &data).await;

            let url = result.unwrap();
            assert_eq!(url, format!("{}/42/general/1.{}", URL_ROOT, ext));

            let meta = h.store.record(1).unwrap();
            assert_eq!(meta.user_id, "42");
            assert_eq!(meta.image_type, image_type);
            assert!(meta.width > 0 && meta.height > 0);
            assert!(!meta.deleted);

            let path = PathBuf::from(format!("/srv/images/42/general/1.{}", ext));
            assert_eq!(h.writer.file(&path), Some(data));
            assert!(h.writer.has_dir(Path::new("/srv/images/42/general")));

            assert_eq!(h.store.save_calls(), 1);
            assert_eq!(
                h.writer.create_dir_calls(),
                vec![
                    PathBuf::from("/srv/images"),
                    PathBuf::from("/srv/images/42/general")
                ]
            );
            assert_eq!(h.writer.write_calls(), vec![path]);
            assert!(h.store.delete_calls().is_empty());
        }
    }

    #[tokio::test]
    async fn test_png_dimensions_and_mime_recorded() {
        let h = harness().await;
        let (_, result) = h.engine.new_image(TOKEN, "avatars", &fixtures::png(10, 20)).await;

        assert_eq!(result.unwrap(), format!("{}/42/avatars/1.png", URL_ROOT));
        let meta = h.store.record(1).unwrap();
        assert_eq!((meta.width, meta.height), (10, 20));
        assert_eq!(meta.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_minimal_bitmap_is_accepted() {
        let h = harness().await;
        let (_, result) = h.engine.new_image(TOKEN, "", &[0x42, 0x4D]).await;

        assert_eq!(result.unwrap(), format!("{}/42/general/1.bmp", URL_ROOT));
        let meta = h.store.record(1).unwrap();
        assert_eq!(meta.image_type, ImageType::Bmp);
        assert_eq!((meta.width, meta.height), (0, 0));
        assert_eq!(meta.mime_type, "image/bmp");
    }

    #[tokio::test]
    async fn test_short_or_unknown_payloads_never_reach_the_store() {
        for data in [&b""[..], &b"B"[..], &b"GIF"[..], &b"plain text"[..]] {
            let h = harness().await;
            let (_, result) = h.engine.new_image(TOKEN, "", data).await;

            assert_eq!(kind(&result), ErrorKind::ClientInput, "payload {:?}", data);
            assert!(h.store.is_empty());
            assert!(h.writer.files().is_empty());
        }
    }

    #[tokio::test]
    async fn test_special_character_folders_rejected_before_side_effects() {
        for folder in ["a-b", "../../etc", "a b", "sub\\dir", "x/y.z"] {
            let h = harness().await;
            let (_, result) = h.engine.new_image(TOKEN, folder, &fixtures::png(2, 2)).await;

            assert_eq!(kind(&result), ErrorKind::ClientInput, "folder {:?}", folder);
            assert!(h.store.is_empty());
            assert!(h.writer.files().is_empty());
            assert!(!h.writer.has_dir(Path::new("/srv/images/42")));
        }
    }

    #[tokio::test]
    async fn test_nested_folders() {
        let h = harness().await;
        let (_, result) = h.engine.new_image(TOKEN, "/a//b/", &fixtures::png(2, 2)).await;

        assert_eq!(result.unwrap(), format!("{}/42/a/b/1.png", URL_ROOT));
        assert!(h.writer.file(Path::new("/srv/images/42/a/b/1.png")).is_some());
    }

    #[tokio::test]
    async fn test_empty_folder_matches_default_folder() {
        let png = fixtures::png(3, 3);

        let defaulted = harness().await.engine.new_image(TOKEN, "", &png).await.1.unwrap();
        let explicit = harness().await.engine.new_image(TOKEN, "general", &png).await.1.unwrap();
        let separators = harness().await.engine.new_image(TOKEN, "/", &png).await.1.unwrap();

        assert_eq!(defaulted, explicit);
        assert_eq!(defaulted, separators);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_metadata() {
        let h = harness().await;
        h.writer.fail_write("disk full");

        let (_, result) = h.engine.new_image(TOKEN, "", &fixtures::png(2, 2)).await;

        assert_eq!(kind(&result), ErrorKind::Internal);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("disk full"));
        assert!(!message.contains("undoing db changes"));
        assert_eq!(h.store.delete_calls(), vec![1]);
        assert!(h.store.record(1).unwrap().deleted);

        assert_eq!(h.store.save_calls(), 1);
        // constructor creates the images root, the upload its own folder
        assert_eq!(h.writer.create_dir_calls().len(), 2);
        assert_eq!(
            h.writer.write_calls(),
            vec![PathBuf::from("/srv/images/42/general/1.png")]
        );
    }

    #[tokio::test]
    async fn test_failed_rollback_is_reported_with_write_error() {
        let h = harness().await;
        h.writer.fail_write("disk full");
        h.store.fail_delete("db went away");

        let (_, result) = h.engine.new_image(TOKEN, "", &fixtures::png(2, 2)).await;

        assert_eq!(kind(&result), ErrorKind::Internal);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("disk full"));
        assert!(message.contains("db went away"));
        assert_eq!(h.store.delete_calls(), vec![1]);
        assert_eq!(h.store.save_calls(), 1);
        assert_eq!(h.writer.write_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_directory_creation_rolls_back_metadata() {
        let h = harness().await;
        h.writer.fail_create_dir("read-only filesystem");

        let (_, result) = h.engine.new_image(TOKEN, "", &fixtures::png(2, 2)).await;

        assert_eq!(kind(&result), ErrorKind::Internal);
        assert!(result.unwrap_err().to_string().contains("read-only filesystem"));
        assert_eq!(h.store.delete_calls(), vec![1]);
        assert!(h.writer.files().is_empty());
        assert!(h.writer.write_calls().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_skips_write_and_rollback() {
        let h = harness().await;
        h.store.fail_save("insert failed");

        let (_, result) = h.engine.new_image(TOKEN, "", &fixtures::png(2, 2)).await;

        assert_eq!(kind(&result), ErrorKind::Internal);
        assert_eq!(h.store.save_calls(), 1);
        assert!(h.writer.write_calls().is_empty());
        assert!(h.store.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let h = harness().await;
        let (_, result) = h.engine.new_image("forged", "", &fixtures::png(2, 2)).await;

        assert_eq!(kind(&result), ErrorKind::Unauthorized);
        assert!(h.store.is_empty());
        assert_eq!(h.validator.calls(), 1);
    }

    #[tokio::test]
    async fn test_token_checked_before_folder() {
        let h = harness().await;
        let (_, result) = h.engine.new_image("forged", "bad-folder", b"").await;
        assert_eq!(kind(&result), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_folder_checked_before_payload() {
        let h = harness().await;
        let (_, result) = h.engine.new_base64_image(TOKEN, "bad-folder", "").await;
        let err = result.unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("special characters"));
    }

    #[tokio::test]
    async fn test_validator_failure_is_internal() {
        let h = harness().await;
        h.validator.fail_internally("key store offline");

        let (_, result) = h.engine.new_image(TOKEN, "", &fixtures::png(2, 2)).await;

        assert_eq!(kind(&result), ErrorKind::Internal);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_path_like_user_id_is_rejected() {
        let validator = StaticTokenValidator::new().with_token("escape", "../..");
        let store = MockMetadataStore::new();
        let engine = IngestionEngine::new(
            &StaticIngestSettings::new("/srv/images"),
            Arc::new(validator),
            Arc::new(store.clone()),
            Arc::new(MockFileWriter::new()),
        )
        .await
        .unwrap();

        let (_, result) = engine.new_image("escape", "", &fixtures::png(2, 2)).await;
        assert_eq!(kind(&result), ErrorKind::Unauthorized);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_base64_matches_raw_upload() {
        let gif = fixtures::gif(6, 9);
        let encoded = STANDARD.encode(&gif);

        let raw = harness().await;
        let raw_url = raw.engine.new_image(TOKEN, "pics", &gif).await.1.unwrap();

        let b64 = harness().await;
        let b64_url = b64.engine.new_base64_image(TOKEN, "pics", &encoded).await.1.unwrap();

        assert_eq!(raw_url, b64_url);
        let (raw_meta, b64_meta) = (raw.store.record(1).unwrap(), b64.store.record(1).unwrap());
        assert_eq!(raw_meta.image_type, b64_meta.image_type);
        assert_eq!((raw_meta.width, raw_meta.height), (b64_meta.width, b64_meta.height));
        assert_eq!(
            b64.writer.file(Path::new("/srv/images/42/pics/1.gif")),
            Some(gif)
        );
    }

    #[tokio::test]
    async fn test_base64_data_url_and_whitespace_accepted() {
        let png = fixtures::png(2, 2);
        let encoded = format!("  data:image/png;base64,{}\n", STANDARD.encode(&png));

        let h = harness().await;
        let (_, result) = h.engine.new_base64_image(TOKEN, "", &encoded).await;
        assert_eq!(result.unwrap(), format!("{}/42/general/1.png", URL_ROOT));
    }

    #[tokio::test]
    async fn test_line_wrapped_base64_accepted() {
        let png = fixtures::png(40, 40);
        let encoded = STANDARD.encode(&png);
        assert!(encoded.len() > 76);

        let wrapped = encoded
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");

        let h = harness().await;
        let (_, result) = h.engine.new_base64_image(TOKEN, "", &wrapped).await;

        assert_eq!(result.unwrap(), format!("{}/42/general/1.png", URL_ROOT));
        assert_eq!(
            h.writer.file(Path::new("/srv/images/42/general/1.png")),
            Some(png)
        );
    }

    #[tokio::test]
    async fn test_empty_and_invalid_base64_are_client_errors() {
        let h = harness().await;

        let (_, empty) = h.engine.new_base64_image(TOKEN, "", "").await;
        let (_, invalid) = h.engine.new_base64_image(TOKEN, "", "***not base64***").await;

        assert_eq!(kind(&empty), ErrorKind::ClientInput);
        assert_eq!(kind(&invalid), ErrorKind::ClientInput);
        assert_ne!(
            empty.unwrap_err().to_string(),
            invalid.unwrap_err().to_string()
        );
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_time_reported_on_failure() {
        let h = harness().await;
        let before = Utc::now();
        let (time, result) = h.engine.new_image("forged", "", b"").await;

        assert!(result.is_err());
        assert!(time >= before && time <= Utc::now());
    }

    #[tokio::test]
    async fn test_sequential_ids_give_distinct_files() {
        let h = harness().await;
        let png = fixtures::png(2, 2);

        let first = h.engine.new_image(TOKEN, "", &png).await.1.unwrap();
        let second = h.engine.new_image(TOKEN, "", &png).await.1.unwrap();

        assert_ne!(first, second);
        assert_eq!(h.writer.files().len(), 2);
    }

    #[tokio::test]
    async fn test_constructor_rejects_bad_settings() {
        let build = |settings: StaticIngestSettings| async move {
            IngestionEngine::new(
                &settings,
                Arc::new(StaticTokenValidator::new()),
                Arc::new(MockMetadataStore::new()),
                Arc::new(MockFileWriter::new()),
            )
            .await
        };

        let mut empty_folder = StaticIngestSettings::new("/srv/images");
        empty_folder.default_folder_name = String::new();
        assert!(build(empty_folder).await.is_err());

        let mut relative_url = StaticIngestSettings::new("/srv/images");
        relative_url.img_url_root = "/v0/imagems".to_string();
        assert!(build(relative_url).await.is_err());

        let mut opaque_url = StaticIngestSettings::new("/srv/images");
        opaque_url.img_url_root = "mailto:images@example.com".to_string();
        assert!(build(opaque_url).await.is_err());
    }

    #[tokio::test]
    async fn test_constructor_fails_when_images_dir_cannot_be_created() {
        let writer = MockFileWriter::new();
        writer.fail_create_dir("permission denied");

        let result = IngestionEngine::new(
            &StaticIngestSettings::new("/srv/images"),
            Arc::new(StaticTokenValidator::new()),
            Arc::new(MockMetadataStore::new()),
            Arc::new(writer),
        )
        .await;

        let err = result.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("permission denied"));
    }

    #[tokio::test]
    async fn test_local_writer_lays_out_image_tree() {
        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        let store = MockMetadataStore::new();
        let engine = IngestionEngine::new(
            &StaticIngestSettings::new(&images_dir),
            Arc::new(StaticTokenValidator::new().with_token(TOKEN, "42")),
            Arc::new(store.clone()),
            Arc::new(LocalFileWriter::new()),
        )
        .await
        .unwrap();
        assert!(images_dir.is_dir());

        let jpeg = fixtures::jpeg(8, 8);
        let (_, result) = engine.new_image(TOKEN, "holiday/2024", &jpeg).await;

        assert_eq!(result.unwrap(), format!("{}/42/holiday/2024/1.jpeg", URL_ROOT));
        let written = std::fs::read(images_dir.join("42/holiday/2024/1.jpeg")).unwrap();
        assert_eq!(written, jpeg);
    }
}
