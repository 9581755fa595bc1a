use std::error::Error;
use std::fmt::{self, Display};
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chatbox_core::attachment::Attachment;
use tokio::fs;

/// An error raised when a file cannot be attached.
#[derive(Debug)]
pub struct AttachError {
    path: PathBuf,
    source: io::Error,
}

impl AttachError {
    /// Returns the path of the file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Display for AttachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot attach {}: {}", self.path.display(), self.source)
    }
}

impl Error for AttachError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Reads the file at `path` into an attachment.
///
/// The MIME type is guessed from the extension, falling back to
/// `application/octet-stream`.
pub async fn load_attachment<P: AsRef<Path>>(
    path: P,
) -> Result<Attachment, AttachError> {
    let path = path.as_ref();
    let to_error = |source| AttachError {
        path: path.to_owned(),
        source,
    };

    let content = fs::read(path).await.map_err(to_error)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            to_error(io::Error::new(io::ErrorKind::InvalidInput, "not a file"))
        })?;
    let mime_type = mime_guess::from_path(path).first_or_octet_stream();
    debug!("loaded {name} ({mime_type}, {} bytes)", content.len());

    Ok(Attachment::new(name, mime_type, Bytes::from(content)))
}
