//! 活动海报存储
//!
//! 上传的图片经过校验后统一转码为 JPEG，保存到
//! `{work_dir}/uploads/event-posters/posters/{stamp}.jpg`。
//! `stamp` 为严格递增的毫秒时间戳，同名源文件也会得到不同的文件名。

use serde::Serialize;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::utils::error::storage_error;
use crate::utils::{AppError, AppResult, ErrorCode};

/// Maximum file size (5MB)
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Supported image formats
pub const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// JPEG quality for posters
const JPEG_QUALITY: u8 = 85;

/// 已保存的海报
#[derive(Debug, Clone, Serialize)]
pub struct StoredPoster {
    pub file_name: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub public_url: String,
    pub original_name: String,
    pub size: usize,
}

/// 海报存储
#[derive(Debug)]
pub struct PosterStorage {
    dir: PathBuf,
    public_base_url: String,
    last_stamp: AtomicI64,
}

impl PosterStorage {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            last_stamp: AtomicI64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 公开访问地址
    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}/api/posters/{}", self.public_base_url, file_name)
    }

    /// 严格递增的毫秒时间戳
    fn next_stamp(&self) -> i64 {
        let now = shared::util::now_millis();
        let previous = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }

    /// 校验、转码并保存
    pub async fn store(&self, original_name: &str, data: Vec<u8>) -> AppResult<StoredPoster> {
        validate_upload(original_name, &data)?;

        let encoded = tokio::task::spawn_blocking(move || reencode_jpeg(&data))
            .await
            .map_err(|e| AppError::with_message(ErrorCode::ImageProcessingFailed, e.to_string()))??;

        let file_name = format!("{}.jpg", self.next_stamp());
        let path = self.dir.join(&file_name);

        tokio::fs::create_dir_all(&self.dir).await.map_err(storage_error)?;
        tokio::fs::write(&path, &encoded).await.map_err(storage_error)?;

        tracing::info!(
            original_name = %original_name,
            file = %file_name,
            size = encoded.len(),
            "Poster stored"
        );

        Ok(StoredPoster {
            public_url: self.public_url(&file_name),
            file_name,
            path,
            original_name: original_name.to_string(),
            size: encoded.len(),
        })
    }

    /// 读取已保存的海报
    pub async fn read(&self, file_name: &str) -> AppResult<Vec<u8>> {
        // Security check: prevent path traversal
        if file_name.is_empty()
            || file_name.contains("..")
            || file_name.contains('/')
            || file_name.contains('\\')
        {
            return Err(AppError::invalid("Invalid filename"));
        }

        match tokio::fs::read(self.dir.join(file_name)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::new(ErrorCode::PosterNotFound).with_detail("file", file_name))
            }
            Err(e) => Err(storage_error(e)),
        }
    }
}

/// 大小、扩展名检查
pub fn validate_upload(original_name: &str, data: &[u8]) -> AppResult<()> {
    if data.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::new(ErrorCode::FileTooLarge)
            .with_detail("max_bytes", MAX_FILE_SIZE)
            .with_detail("size", data.len()));
    }

    let ext = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| {
            AppError::new(ErrorCode::InvalidFileExtension).with_detail("file", original_name)
        })?;

    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(AppError::new(ErrorCode::UnsupportedFileFormat)
            .with_detail("format", ext)
            .with_detail("supported", SUPPORTED_FORMATS.join(", ")));
    }
    Ok(())
}

/// 解码并重新编码为 JPEG
fn reencode_jpeg(data: &[u8]) -> AppResult<Vec<u8>> {
    let img = image::load_from_memory(data).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidImageFile, format!("Invalid image file: {e}"))
    })?;

    let mut buffer = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut buffer), JPEG_QUALITY);
    img.to_rgb8().write_with_encoder(encoder).map_err(|e| {
        AppError::with_message(
            ErrorCode::ImageProcessingFailed,
            format!("Failed to compress image: {e}"),
        )
    })?;
    Ok(buffer)
}
