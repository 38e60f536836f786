use crate::domain::model::ImageHandle;
use crate::domain::ports::ImageSource;
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

async fn read_image(path: &Path) -> Result<ImageHandle> {
    let source_ref = path.display().to_string();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == IoErrorKind::PermissionDenied => {
            return Err(ScanError::PermissionDenied {
                message: format!("cannot read {}", source_ref),
            })
        }
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            return Err(ScanError::InvalidImage {
                source_ref,
                reason: "file not found".to_string(),
            })
        }
        Err(e) => return Err(ScanError::IoError(e)),
    };

    if bytes.is_empty() {
        return Err(ScanError::InvalidImage {
            source_ref,
            reason: "file is empty".to_string(),
        });
    }

    Ok(ImageHandle::new(source_ref, bytes))
}

/// Reads a label photo that was already captured to disk.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    async fn acquire(&self) -> Result<ImageHandle> {
        read_image(&self.path).await
    }
}

/// Asks for an image path on an input stream. An empty answer or end of
/// input counts as the user dismissing the capture.
pub struct PromptImageSource<R> {
    input: Mutex<R>,
}

impl<R> PromptImageSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

impl PromptImageSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> ImageSource for PromptImageSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn acquire(&self) -> Result<ImageHandle> {
        eprint!("📷 Path to label photo (leave empty to cancel): ");

        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await?;
        let answer = line.trim();
        if read == 0 || answer.is_empty() {
            return Err(ScanError::UserCancelled);
        }

        read_image(Path::new(answer)).await
    }
}
