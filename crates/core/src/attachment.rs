//! Files attached to a user turn.

use bytes::Bytes;
use mime::Mime;

use crate::message::Preview;

/// A file the user attached to a turn.
///
/// The content is held only for the duration of the submission. Neither
/// the bytes nor the attachment itself are written to the history store,
/// only the summary line derived from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    name: String,
    mime_type: Mime,
    size: u64,
    content: Bytes,
}

impl Attachment {
    /// Creates an attachment, taking its size from the content.
    pub fn new<S: Into<String>>(name: S, mime_type: Mime, content: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type,
            size: content.len() as u64,
            content,
        }
    }

    /// Returns the file name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the MIME type.
    #[inline]
    pub fn mime_type(&self) -> &Mime {
        &self.mime_type
    }

    /// Returns the size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the file content.
    #[inline]
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Returns the human-readable line recorded in the conversation for
    /// this attachment.
    pub fn summary(&self) -> String {
        format!(
            "📎 Uploaded: {} ({}, {})",
            self.name,
            self.mime_type.essence_str(),
            format_bytes(self.size)
        )
    }

    /// Returns the preview to show for this attachment. Only images and
    /// PDF documents get one.
    pub fn preview(&self) -> Option<Preview> {
        if self.mime_type.type_() == mime::IMAGE {
            Some(Preview::Image {
                name: self.name.clone(),
                mime_type: self.mime_type.essence_str().to_owned(),
            })
        } else if self.mime_type.essence_str() == mime::APPLICATION_PDF.essence_str()
        {
            Some(Preview::Document {
                name: self.name.clone(),
            })
        } else {
            None
        }
    }
}

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Formats a byte count with 1024-based units and at most two decimals.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_owned();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{value:.2}");
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{formatted} {}", SIZE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(1), "1 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(2048), "2 KB");
        assert_eq!(format_bytes(1_234_567), "1.18 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5 GB");
    }

    #[test]
    fn test_pdf_summary_and_preview() {
        let attachment = Attachment::new(
            "report.pdf",
            mime::APPLICATION_PDF,
            Bytes::from(vec![0u8; 2048]),
        );
        assert_eq!(attachment.size(), 2048);
        assert_eq!(
            attachment.summary(),
            "📎 Uploaded: report.pdf (application/pdf, 2 KB)"
        );
        assert_eq!(
            attachment.preview(),
            Some(Preview::Document {
                name: "report.pdf".to_owned()
            })
        );
    }

    #[test]
    fn test_preview_kinds() {
        let image = Attachment::new(
            "cat.png",
            mime::IMAGE_PNG,
            Bytes::from_static(b"\x89PNG"),
        );
        assert_eq!(
            image.preview(),
            Some(Preview::Image {
                name: "cat.png".to_owned(),
                mime_type: "image/png".to_owned(),
            })
        );

        let text = Attachment::new(
            "notes.txt",
            mime::TEXT_PLAIN_UTF_8,
            Bytes::from_static(b"hello"),
        );
        assert_eq!(text.preview(), None);
        assert_eq!(
            text.summary(),
            "📎 Uploaded: notes.txt (text/plain, 5 Bytes)"
        );
    }
}
