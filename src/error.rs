//! Central error type for schema construction, parsing and dispatch.
//!
//! Construction errors are raised synchronously by the schema builder.
//! Everything else is raised while a document is driven through a
//! [`SchemaHandler`](crate::SchemaHandler) and aborts that parse.

use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

use crate::qname::QName;

/// All errors produced by this crate.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A listener of the other kind is already attached to this element.
    ListenerConflict {
        /// Element the listener was attached to.
        element: QName,
        /// Kind of the listener that is already attached.
        existing: &'static str,
    },
    /// A text-element listener was attached to an element that has children.
    TextElementWithChildren {
        /// The offending element.
        element: QName,
    },
    /// A child was declared under an element that has a text-element listener.
    ChildOfTextElement {
        /// The text-element leaf.
        element: QName,
        /// The child that was requested.
        child: QName,
    },
    /// The XML parser rejected the document. The parser's own error is kept unchanged.
    Xml {
        /// Error reported by quick-xml.
        source: quick_xml::Error,
        /// Byte offset where the parser stopped.
        position: u64,
    },
    /// The document is not well-formed in a way detected outside the parser
    /// (unbound prefix, unknown entity, text outside the root, invalid UTF-8).
    MalformedXml {
        /// Description of the problem.
        message: Cow<'static, str>,
        /// Byte offset of the offending event.
        position: u64,
    },
    /// The document ended while elements were still open.
    IllFormedDocument {
        /// Number of elements left open.
        open_elements: usize,
    },
    /// An element closed without containing a child that was declared required.
    MissingRequiredChild {
        /// The element that closed.
        parent: QName,
        /// The first declared required child that was never seen.
        child: QName,
        /// Byte offset of the closing tag.
        position: u64,
    },
    /// Element nesting exceeded [`ParseOptions::max_depth`](crate::ParseOptions::max_depth).
    DepthLimitExceeded {
        /// Configured limit.
        limit: usize,
        /// Byte offset of the element that crossed the limit.
        position: u64,
    },
    /// Reading the input failed.
    Io(Arc<std::io::Error>),
    /// A listener returned an error. Surfaced to the caller unchanged.
    Listener(Box<dyn std::error::Error + 'static>),
    /// A listener was invoked while it was already running (re-entrant parse of the same schema).
    ListenerBusy {
        /// Element whose listener is busy.
        element: QName,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListenerConflict { element, existing } => write!(
                f,
                "element '{element}' already has {existing} listener"
            ),
            Self::TextElementWithChildren { element } => write!(
                f,
                "element '{element}' has children and cannot take a text element listener"
            ),
            Self::ChildOfTextElement { element, child } => write!(
                f,
                "element '{element}' has a text element listener and cannot have child '{child}'"
            ),
            Self::Xml { source, position } => write!(f, "XML parse error at byte {position}: {source}"),
            Self::MalformedXml { message, position } => {
                write!(f, "malformed XML at byte {position}: {message}")
            }
            Self::IllFormedDocument { open_elements } => write!(
                f,
                "document ended with {open_elements} unclosed element(s)"
            ),
            Self::MissingRequiredChild { parent, child, position } => write!(
                f,
                "element '{parent}' is missing required child '{child}' (at byte {position})"
            ),
            Self::DepthLimitExceeded { limit, position } => write!(
                f,
                "element nesting exceeds limit of {limit} at byte {position}"
            ),
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Listener(e) => write!(f, "listener failed: {e}"),
            Self::ListenerBusy { element } => write!(
                f,
                "listener of element '{element}' is already running"
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Xml { source, .. } => Some(source),
            Self::Io(e) => Some(e.as_ref()),
            Self::Listener(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl Error {
    /// Wraps an arbitrary error raised inside a listener.
    pub fn listener(err: impl Into<Box<dyn std::error::Error + 'static>>) -> Self {
        Self::Listener(err.into())
    }

    /// Erstellt einen `MalformedXml` Fehler mit Position.
    pub fn malformed(message: impl Into<Cow<'static, str>>, position: u64) -> Self {
        Self::MalformedXml {
            message: message.into(),
            position,
        }
    }

    /// Whether this error was raised by the schema builder.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::ListenerConflict { .. }
                | Self::TextElementWithChildren { .. }
                | Self::ChildOfTextElement { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(Arc::new(e))
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
