use std::fmt;

/// The upload banner.
///
/// Overwritten by every upload attempt. Only [`UploadStatus::Uploading`] is
/// transient; the other states are terminal for their attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// A document is on its way to the backend.
    Uploading,
    /// The backend accepted the document.
    Uploaded {
        /// Name of the accepted file.
        file_name: String,
    },
    /// The backend answered with a non-2xx status.
    Failed,
    /// The backend could not be reached.
    ConnectionError,
}

impl UploadStatus {
    /// Returns true while the attempt is still in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, UploadStatus::Uploading)
    }

    /// Returns true if the attempt succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, UploadStatus::Uploaded { .. })
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Uploading => write!(f, "Uploading..."),
            UploadStatus::Uploaded { file_name } => {
                write!(f, "✅ Document Uploaded: {file_name}")
            }
            UploadStatus::Failed => write!(f, "❌ Upload Failed"),
            UploadStatus::ConnectionError => write!(f, "⚠️ Error connecting to server"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_text() {
        assert_eq!(UploadStatus::Uploading.to_string(), "Uploading...");
        assert_eq!(
            UploadStatus::Uploaded {
                file_name: "report.pdf".to_string()
            }
            .to_string(),
            "✅ Document Uploaded: report.pdf"
        );
        assert_eq!(UploadStatus::Failed.to_string(), "❌ Upload Failed");
        assert_eq!(
            UploadStatus::ConnectionError.to_string(),
            "⚠️ Error connecting to server"
        );
    }

    #[test]
    fn predicates() {
        assert!(UploadStatus::Uploading.is_in_flight());
        assert!(!UploadStatus::Failed.is_in_flight());
        assert!(
            UploadStatus::Uploaded {
                file_name: "a.pdf".to_string()
            }
            .is_success()
        );
        assert!(!UploadStatus::ConnectionError.is_success());
    }
}
