use std::path::Path;

use crate::error::{Error, Result};

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    file_name: String,
    bytes: Vec<u8>,
}

impl Document {
    /// Wraps in-memory file contents.
    ///
    /// Only `.pdf` files are accepted.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        if !has_pdf_extension(&file_name) {
            return Err(Error::validation(
                format!("{file_name} is not a .pdf file"),
                Some("file".to_string()),
            ));
        }
        Ok(Self { file_name, bytes })
    }

    /// Reads a document from disk.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            return Err(Error::validation(
                format!("{} does not name a file", path.display()),
                Some("file".to_string()),
            ));
        };
        if !has_pdf_extension(file_name) {
            return Err(Error::validation(
                format!("{file_name} is not a .pdf file"),
                Some("file".to_string()),
            ));
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        Ok(Self {
            file_name: file_name.to_string(),
            bytes,
        })
    }

    /// The file name sent as the multipart part's file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The raw file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

fn has_pdf_extension(file_name: &str) -> bool {
    file_name.to_lowercase().ends_with(".pdf")
}

/// Acknowledgement of a 2xx upload. The body is never read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadReceipt {
    /// HTTP status code of the reply.
    pub status: u16,
}
