//! Input manager for reading job descriptions and resume uploads from disk

use crate::error::{Result, ResumeRankerError};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PlainTextExtractor, TextExtractor};
use crate::processing::document::Upload;
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Default)]
pub struct InputManager;

impl InputManager {
    pub fn new() -> Self {
        Self
    }

    /// Read a job description from a `.txt` or `.md` file.
    pub async fn read_job_description(&self, path: &Path) -> Result<String> {
        let bytes = self.read_bytes(path).await?;

        match FileType::from_path(path) {
            FileType::Text => {
                info!("Reading plain text job description: {}", path.display());
                PlainTextExtractor.extract(&bytes)
            }
            FileType::Markdown => {
                info!("Processing markdown job description: {}", path.display());
                MarkdownExtractor.extract(&bytes)
            }
            FileType::Pdf | FileType::Unknown => Err(ResumeRankerError::UnsupportedFormat(format!(
                "Job description must be a .txt or .md file: {}",
                path.display()
            ))),
        }
    }

    /// Read one resume fully into memory. The upload is named after the file name.
    pub async fn read_upload(&self, path: &Path) -> Result<Upload> {
        if FileType::from_path(path) != FileType::Pdf {
            return Err(ResumeRankerError::UnsupportedFormat(format!(
                "Resumes must be PDF files: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| ResumeRankerError::InvalidInput(format!("Not a file path: {}", path.display())))?;

        let bytes = self.read_bytes(path).await?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());

        Ok(Upload::new(name, bytes))
    }

    /// Read every resume in order. Fails on the first unreadable path.
    pub async fn read_uploads(&self, paths: &[PathBuf]) -> Result<Vec<Upload>> {
        let mut uploads = Vec::with_capacity(paths.len());
        for path in paths {
            uploads.push(self.read_upload(path).await?);
        }
        Ok(uploads)
    }

    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.exists() {
            return Err(ResumeRankerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }
        Ok(fs::read(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upload_named_after_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alice_smith.pdf");
        std::fs::write(&path, b"%PDF-1.4 stub").unwrap();

        let upload = InputManager::new().read_upload(&path).await.unwrap();
        assert_eq!(upload.name, "alice_smith.pdf");
        assert_eq!(upload.bytes, b"%PDF-1.4 stub".to_vec());
    }

    #[tokio::test]
    async fn test_non_pdf_upload_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resume.docx");
        std::fs::write(&path, b"data").unwrap();

        let result = InputManager::new().read_upload(&path).await;
        assert!(matches!(result, Err(ResumeRankerError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_missing_upload() {
        let temp_dir = TempDir::new().unwrap();
        let result = InputManager::new()
            .read_upload(&temp_dir.path().join("ghost.pdf"))
            .await;
        assert!(matches!(result, Err(ResumeRankerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_job_description_from_markdown() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("job.md");
        std::fs::write(&path, "# Backend Engineer\n\n**Rust** and Kafka").unwrap();

        let text = InputManager::new().read_job_description(&path).await.unwrap();
        assert_eq!(text, "Backend Engineer\nRust and Kafka");
    }

    #[tokio::test]
    async fn test_job_description_must_be_text() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("job.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        assert!(InputManager::new().read_job_description(&path).await.is_err());
    }
}
