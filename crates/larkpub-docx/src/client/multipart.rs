//! `multipart/form-data` encoding for media uploads.

use rand::RngExt;

/// File part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Text fields plus at most one file, encoded in insertion order with the file last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    file: Option<FilePart>,
}

impl MultipartForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    #[must_use]
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_owned(), value.into()));
        self
    }

    /// Set the file part, replacing any previous one.
    #[must_use]
    pub fn file(mut self, field: &str, file_name: &str, content_type: &str, data: Vec<u8>) -> Self {
        self.file = Some(FilePart {
            field: field.to_owned(),
            file_name: file_name.to_owned(),
            content_type: content_type.to_owned(),
            data,
        });
        self
    }

    /// Value of a text field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn file_part(&self) -> Option<&FilePart> {
        self.file.as_ref()
    }

    /// Encode the form body using `boundary`.
    pub(crate) fn encode(&self, boundary: &str) -> Vec<u8> {
        let mut body = Vec::new();

        for (name, value) in &self.fields {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }

        if let Some(file) = &self.file {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    file.field, file.file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
            body.extend_from_slice(&file.data);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        body
    }
}

/// Random boundary, fresh for every send.
pub(crate) fn new_boundary() -> String {
    format!("----LarkpubFormBoundary{:016x}", rand::rng().random::<u64>())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_encode_fields_then_file() {
        let form = MultipartForm::new()
            .text("file_name", "shot.png")
            .text("size", "3")
            .file("file", "shot.png", "application/octet-stream", vec![1, 2, 3]);

        let body = form.encode("XYZ");

        let mut expected = Vec::new();
        expected.extend_from_slice(
            b"--XYZ\r\nContent-Disposition: form-data; name=\"file_name\"\r\n\r\nshot.png\r\n",
        );
        expected.extend_from_slice(
            b"--XYZ\r\nContent-Disposition: form-data; name=\"size\"\r\n\r\n3\r\n",
        );
        expected.extend_from_slice(
            b"--XYZ\r\nContent-Disposition: form-data; name=\"file\"; filename=\"shot.png\"\r\n",
        );
        expected.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        expected.extend_from_slice(&[1, 2, 3]);
        expected.extend_from_slice(b"\r\n--XYZ--\r\n");
        assert_eq!(body, expected);
    }

    #[test]
    fn test_field_lookup() {
        let form = MultipartForm::new().text("parent_type", "docx_image");
        assert_eq!(form.field("parent_type"), Some("docx_image"));
        assert_eq!(form.field("missing"), None);
        assert!(form.file_part().is_none());
    }

    #[test]
    fn test_boundaries_differ() {
        let a = new_boundary();
        let b = new_boundary();
        assert!(a.starts_with("----LarkpubFormBoundary"));
        assert_ne!(a, b);
    }
}
