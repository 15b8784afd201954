//! Attachment selection and per-file checks.

use std::io;
use std::path::Path;

use bytes::Bytes;
use futures::future;

use crate::error::ValidationError;
use crate::traits::FilePart;

/// Form field the backend reads attachments from
pub const FILES_FIELD: &str = "files";

/// Limits a file must satisfy before it is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePolicy {
    pub max_file_bytes: usize,
    /// Tighter limit for `text/plain`
    pub max_text_bytes: usize,
    pub allowed_types: Vec<String>,
}

impl Default for FilePolicy {
    fn default() -> Self {
        Self {
            max_file_bytes: 5 * 1024 * 1024,
            max_text_bytes: 100 * 1024,
            allowed_types: ["image/jpeg", "image/jpg", "image/png", "image/gif", "text/plain"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl FilePolicy {
    /// Check one file, returning the message shown when it is rejected.
    pub fn check(&self, file: &SelectedFile) -> Result<(), String> {
        if file.data.len() > self.max_file_bytes {
            return Err(format!(
                "File {} is too large. Maximum size is {}.",
                file.filename,
                human_size(self.max_file_bytes)
            ));
        }
        let content_type = file.content_type.to_ascii_lowercase();
        if !self.allowed_types.iter().any(|t| *t == content_type) {
            return Err(invalid_format(&file.filename));
        }
        if content_type == "text/plain" {
            if !file.filename.to_ascii_lowercase().ends_with(".txt") {
                return Err(invalid_format(&file.filename));
            }
            if file.data.len() > self.max_text_bytes {
                return Err(format!(
                    "File {} is too large. Maximum size for text files is {}.",
                    file.filename,
                    human_size(self.max_text_bytes)
                ));
            }
        }
        Ok(())
    }
}

fn invalid_format(filename: &str) -> String {
    format!(
        "File {} has an invalid format. Only JPG, GIF, PNG, and txt files are allowed.",
        filename
    )
}

fn human_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 && bytes % (1024 * 1024) == 0 {
        format!("{}MB", bytes / (1024 * 1024))
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{}KB", bytes / 1024)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Content type for a filename, by extension
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// A local file picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Build from a filename, guessing the content type from its extension.
    pub fn guess(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        let content_type = content_type_for(&filename);
        Self::new(filename, content_type, data)
    }

    /// Read a file from disk, named after the last path component.
    pub async fn read(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is not a file", path.display()),
                )
            })?;
        let data = tokio::fs::read(path).await?;
        Ok(Self::guess(filename, data))
    }

    /// Read several files concurrently; fails on the first unreadable one.
    pub async fn read_all<P>(paths: impl IntoIterator<Item = P>) -> io::Result<Vec<Self>>
    where
        P: AsRef<Path>,
    {
        future::try_join_all(paths.into_iter().map(|path| Self::read(path))).await
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn to_part(&self) -> FilePart {
        FilePart {
            field: FILES_FIELD.to_string(),
            filename: self.filename.clone(),
            content_type: self.content_type.clone(),
            data: self.data.clone(),
        }
    }
}

/// Files currently attached to a draft
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    policy: FilePolicy,
    files: Vec<SelectedFile>,
}

impl FileSelection {
    pub fn new(policy: FilePolicy) -> Self {
        Self {
            policy,
            files: Vec::new(),
        }
    }

    /// Attach every acceptable file.
    ///
    /// Rejected files are left out and reported together, one message each;
    /// the accepted ones stay attached either way.
    pub fn add(&mut self, files: impl IntoIterator<Item = SelectedFile>) -> Result<(), ValidationError> {
        let mut rejected = Vec::new();
        for file in files {
            match self.policy.check(&file) {
                Ok(()) => self.files.push(file),
                Err(message) => rejected.push(message),
            }
        }
        if rejected.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::from_messages(rejected))
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<SelectedFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn policy(&self) -> &FilePolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str, size: usize) -> SelectedFile {
        SelectedFile::new(name, "image/png", vec![0u8; size])
    }

    #[test]
    fn test_add_keeps_valid_and_reports_invalid() {
        let mut selection = FileSelection::default();
        let err = selection
            .add(vec![png("ok.png", 10), png("big.png", 6 * 1024 * 1024)])
            .unwrap_err();

        assert_eq!(selection.len(), 1);
        assert_eq!(selection.files()[0].filename, "ok.png");
        assert!(err.mentions("big.png"));
        assert_eq!(
            err.messages,
            vec!["File big.png is too large. Maximum size is 5MB.".to_string()]
        );
    }

    #[test]
    fn test_rejects_unknown_type() {
        let mut selection = FileSelection::default();
        let err = selection
            .add(vec![SelectedFile::new("a.pdf", "application/pdf", vec![1u8])])
            .unwrap_err();
        assert_eq!(
            err.messages[0],
            "File a.pdf has an invalid format. Only JPG, GIF, PNG, and txt files are allowed."
        );
        assert!(selection.is_empty());
    }

    #[test]
    fn test_text_files_have_tighter_limit() {
        let mut selection = FileSelection::default();
        let err = selection
            .add(vec![
                SelectedFile::new("notes.txt", "text/plain", vec![b'a'; 200 * 1024]),
                SelectedFile::new("small.txt", "text/plain", vec![b'a'; 10]),
            ])
            .unwrap_err();
        assert!(err.mentions("notes.txt"));
        assert!(err.messages[0].contains("100KB"));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_text_file_needs_txt_extension() {
        let mut selection = FileSelection::default();
        assert!(selection
            .add(vec![SelectedFile::new("notes.md", "text/plain", vec![1u8])])
            .is_err());
    }

    #[test]
    fn test_one_message_per_rejected_file() {
        let mut selection = FileSelection::default();
        let err = selection
            .add(vec![
                png("a.png", 6 * 1024 * 1024),
                SelectedFile::new("b.exe", "application/x-msdownload", vec![1u8]),
            ])
            .unwrap_err();
        assert_eq!(err.messages.len(), 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut selection = FileSelection::default();
        selection.add(vec![png("a.png", 1), png("b.png", 1)]).unwrap();
        assert_eq!(selection.remove(0).map(|f| f.filename), Some("a.png".to_string()));
        assert!(selection.remove(5).is_none());
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(SelectedFile::guess("A.JPG", vec![1u8]).content_type, "image/jpeg");
        assert_eq!(content_type_for("notes.txt"), "text/plain");
        assert_eq!(content_type_for("archive"), "application/octet-stream");
    }

    #[test]
    fn test_to_part_uses_files_field() {
        let part = png("a.png", 3).to_part();
        assert_eq!(part.field, "files");
        assert_eq!(part.data.len(), 3);
    }

    #[tokio::test]
    async fn test_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let file = SelectedFile::read(&path).await.unwrap();
        assert_eq!(file.filename, "notes.txt");
        assert_eq!(file.content_type, "text/plain");
        assert_eq!(file.data, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_read_all_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.png");
        std::fs::write(&present, [1u8, 2, 3]).unwrap();

        let files = SelectedFile::read_all([&present]).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content_type, "image/png");

        let missing = dir.path().join("missing.gif");
        assert!(SelectedFile::read_all([&present, &missing]).await.is_err());
    }
}
