use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Input bytes are not a usable PDF (unparseable, encrypted, or page-less).
    DocumentOpen(String),
    /// Logo or signature could not be decoded, or decoded to zero pixels.
    InvalidImage(String),
    /// Failure while editing or serializing the document.
    Pdf(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DocumentOpen(message) => write!(f, "PDF file could not be opened: {message}"),
            Error::InvalidImage(message) => write!(f, "image processing failed: {message}"),
            Error::Pdf(message) => write!(f, "PDF error: {message}"),
            Error::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}

pub(crate) fn pdf_err(context: &str, err: lopdf::Error) -> Error {
    Error::Pdf(format!("{context}: {err}"))
}
