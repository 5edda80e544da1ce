use axum::{
    body::Body,
    http::header,
    response::{IntoResponse, Response},
};

use crate::blobs::{BlobStream, DocumentKind};

const OCTET_STREAM: &str = "application/octet-stream";
const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Extension → MIME type for the document formats applicants upload.
const MIME_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    ("rtf", "application/rtf"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("json", "application/json"),
    ("xml", "text/xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("zip", "application/zip"),
];

pub fn content_type(kind: DocumentKind, path: &str) -> &'static str {
    let extension = std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let Some(extension) = extension else {
        return OCTET_STREAM;
    };

    if kind == DocumentKind::CoverLetter && extension == "docx" {
        return DOCX;
    }
    MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or(OCTET_STREAM)
}

/// How the client should present a downloaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn for_kind(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Resume => Disposition::Inline,
            DocumentKind::CoverLetter => Disposition::Attachment,
        }
    }

    pub fn header_value(&self, filename: &str) -> String {
        let disposition = match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        };
        format!("{disposition}; filename=\"{}\"", filename.replace('"', ""))
    }
}

/// A stored document ready to be streamed back to the caller.
pub struct StoredDocument {
    pub content_type: &'static str,
    pub disposition: Disposition,
    pub filename: String,
    pub body: BlobStream,
}

impl IntoResponse for StoredDocument {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    self.disposition.header_value(&self.filename),
                ),
            ],
            Body::from_stream(self.body),
        )
            .into_response()
    }
}
