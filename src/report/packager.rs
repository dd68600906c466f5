//! Converts a completed draft into a multipart submission payload

use std::fs;
use std::path::PathBuf;

use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::debug;

use super::draft::{DraftField, IssueDraft, PhotoSource};

/// Multipart field name carrying each photo
pub const PHOTOS_PART: &str = "photos";

/// Scalar fields sent as text parts, in wire order
pub const TEXT_FIELDS: &[DraftField] = &[
    DraftField::Title,
    DraftField::Description,
    DraftField::Location,
    DraftField::Category,
    DraftField::Severity,
    DraftField::FullName,
    DraftField::Email,
    DraftField::Phone,
];

/// Errors raised while packaging a draft
#[derive(Error, Debug)]
pub enum PackagingError {
    #[error("could not read photo '{filename}' from {path:?}: {source}")]
    UnreadablePhoto {
        filename: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("photo '{filename}' has invalid MIME type '{mime_type}'")]
    InvalidMimeType { filename: String, mime_type: String },
}

/// A named text entry in the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPart {
    pub name: &'static str,
    pub value: String,
}

/// A named binary entry in the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: &'static str,
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Transmittable form of a draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub text_parts: Vec<TextPart>,
    pub file_parts: Vec<FilePart>,
}

impl SubmissionPayload {
    /// Value of a text part by wire name
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text_parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Filenames of the photo parts in payload order
    pub fn photo_filenames(&self) -> Vec<&str> {
        self.file_parts.iter().map(|p| p.filename.as_str()).collect()
    }

    pub fn total_bytes(&self) -> usize {
        self.file_parts.iter().map(|p| p.bytes.len()).sum()
    }

    /// Build the multipart form sent to the submission endpoint.
    ///
    /// MIME types are checked by `package`; a hand-built part with an
    /// unparsable type is sent without a content type.
    pub fn to_form(&self) -> Form {
        let mut form = Form::new();

        for part in &self.text_parts {
            form = form.text(part.name, part.value.clone());
        }

        for file in &self.file_parts {
            let base = || Part::bytes(file.bytes.clone()).file_name(file.filename.clone());
            let part = base().mime_str(&file.mime_type).unwrap_or_else(|_| base());
            form = form.part(file.name, part);
        }

        form
    }
}

/// Package a validated draft. The draft is only read.
pub fn package(draft: &IssueDraft) -> Result<SubmissionPayload, PackagingError> {
    let text_parts = TEXT_FIELDS
        .iter()
        .map(|field| TextPart {
            name: field.wire_name(),
            value: draft.text(*field).unwrap_or_default().to_string(),
        })
        .collect();

    let mut file_parts = Vec::with_capacity(draft.photos.len());
    for photo in &draft.photos {
        let bytes = match &photo.source {
            PhotoSource::Bytes(bytes) => bytes.clone(),
            PhotoSource::File(path) => {
                fs::read(path).map_err(|source| PackagingError::UnreadablePhoto {
                    filename: photo.filename.clone(),
                    path: path.clone(),
                    source,
                })?
            }
        };

        if photo.mime_type.parse::<mime_guess::mime::Mime>().is_err() {
            return Err(PackagingError::InvalidMimeType {
                filename: photo.filename.clone(),
                mime_type: photo.mime_type.clone(),
            });
        }

        file_parts.push(FilePart {
            name: PHOTOS_PART,
            filename: photo.filename.clone(),
            mime_type: photo.mime_type.clone(),
            bytes,
        });
    }

    let payload = SubmissionPayload {
        text_parts,
        file_parts,
    };

    debug!(
        photos = payload.file_parts.len(),
        bytes = payload.total_bytes(),
        "Packaged issue draft"
    );

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::draft::Photo;
    use tempfile::TempDir;

    fn complete_draft() -> IssueDraft {
        IssueDraft {
            title: "Pothole".to_string(),
            description: "Large pothole on 5th Ave".to_string(),
            location: "5th Ave & Main".to_string(),
            category: "Infrastructure".to_string(),
            severity: "High".to_string(),
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            photos: vec![
                Photo::from_bytes("first.jpg", "image/jpeg", vec![1, 2, 3]),
                Photo::from_bytes("second.png", "image/png", vec![4, 5]),
            ],
            ..IssueDraft::default()
        }
    }

    #[test]
    fn test_package_emits_eight_text_parts_in_order() {
        let payload = package(&complete_draft()).unwrap();
        let names: Vec<&str> = payload.text_parts.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec!["title", "description", "location", "category", "severity", "contact", "email", "phone"]
        );
        assert_eq!(payload.text("contact"), Some("Ada Lovelace"));
        assert_eq!(payload.text("description"), Some("Large pothole on 5th Ave"));
    }

    #[test]
    fn test_package_keeps_photo_order() {
        let payload = package(&complete_draft()).unwrap();
        assert_eq!(payload.photo_filenames(), vec!["first.jpg", "second.png"]);
        assert!(payload.file_parts.iter().all(|p| p.name == PHOTOS_PART));
        assert_eq!(payload.file_parts[1].bytes, vec![4, 5]);
        assert_eq!(payload.total_bytes(), 5);
    }

    #[test]
    fn test_package_does_not_mutate_draft() {
        let draft = complete_draft();
        let before = draft.clone();
        let _ = package(&draft).unwrap();
        assert_eq!(draft, before);
    }

    #[test]
    fn test_package_reads_photos_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("crack.png");
        std::fs::write(&path, b"png-bytes").unwrap();

        let mut draft = complete_draft();
        draft.photos = vec![Photo::from_path(&path)];

        let payload = package(&draft).unwrap();
        assert_eq!(payload.file_parts[0].bytes, b"png-bytes".to_vec());
        assert_eq!(payload.file_parts[0].mime_type, "image/png");
    }

    #[test]
    fn test_unreadable_photo_is_packaging_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut draft = complete_draft();
        draft.photos = vec![Photo::from_path(temp_dir.path().join("missing.jpg"))];

        let err = package(&draft).unwrap_err();
        match err {
            PackagingError::UnreadablePhoto { filename, .. } => {
                assert_eq!(filename, "missing.jpg");
            }
            other => panic!("Expected UnreadablePhoto, got {:?}", other),
        }
    }

    #[test]
    fn test_package_rejects_bad_mime() {
        let mut draft = complete_draft();
        draft.photos = vec![Photo::from_bytes("x.bin", "not a mime", vec![0])];
        assert!(matches!(
            package(&draft),
            Err(PackagingError::InvalidMimeType { .. })
        ));
    }

    #[test]
    fn test_to_form_keeps_part_with_unparsable_mime() {
        let mut payload = package(&complete_draft()).unwrap();
        payload.file_parts[0].mime_type = "not a mime".to_string();
        let form = payload.to_form();
        assert!(!form.boundary().is_empty());
    }
}
