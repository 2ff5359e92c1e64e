use std::fmt;
use std::str::Utf8Error;
use std::string::FromUtf8Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while reading, editing or writing a [`Document`](crate::Document).
///
/// Lookups never fail with an error: a missing node or attribute is `None`.
#[derive(Debug)]
pub enum Error {
    /// Reading the input or writing the output failed.
    Io(std::io::Error),
    /// The bytes don't match the detected encoding, or the declared encoding is unknown.
    CannotDecode,
    /// The input is not well-formed, e.g. unbalanced tags or two root elements.
    /// The message says what was found.
    MalformedXML(String),
    /// The document root can't become the child of another node.
    RootCannotMove,
    /// The node is already attached. Call `node.detach()` first.
    HasAParent,
    /// The node would become its own ancestor.
    CyclicTree,
    IndexOutOfBounds { index: usize, len: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {}", err),
            Error::CannotDecode => f.write_str("could not decode input"),
            Error::MalformedXML(msg) => write!(f, "malformed xml: {}", msg),
            Error::RootCannotMove => f.write_str("the root node can't be attached to a parent"),
            Error::HasAParent => f.write_str("node is attached to a parent, detach it first"),
            Error::CyclicTree => f.write_str("node can't be attached inside its own subtree"),
            Error::IndexOutOfBounds { index, len } => {
                write!(f, "child index {} out of bounds (len {})", index, len)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Error::Io(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Error {
        use quick_xml::Error as XmlError;
        match err {
            XmlError::Io(err) => Error::Io(err),
            XmlError::Utf8(_) => Error::CannotDecode,
            XmlError::EndEventMismatch { expected, found } if expected.is_empty() => {
                Error::MalformedXML(format!("</{}> closes nothing", found))
            }
            XmlError::EndEventMismatch { expected, found } => {
                Error::MalformedXML(format!("expected </{}>, found </{}>", expected, found))
            }
            other => Error::MalformedXML(other.to_string()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<Utf8Error> for Error {
    fn from(_: Utf8Error) -> Error {
        Error::CannotDecode
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_: FromUtf8Error) -> Error {
        Error::CannotDecode
    }
}
