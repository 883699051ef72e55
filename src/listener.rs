//! Listener contracts attached to schema elements.
//!
//! An element carries at most one listener, of one of two shapes:
//!
//! - [`ElementListener`]: `start(attributes)` and `end()`, for interior elements.
//! - [`TextElementListener`]: `start(attributes)` and `end(body)`, for text
//!   leaves. The body is the concatenation of all character data inside the
//!   element, delivered once when it closes.
//!
//! Returning an error from any callback aborts the parse; the error reaches
//! the caller unchanged.
//!
//! # Beispiel
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use safesax::RootElement;
//! use safesax::listener::end_text;
//!
//! let titles = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&titles);
//!
//! let mut root = RootElement::new("", "rss");
//! root.get_child("channel")?
//!     .get_child("title")?
//!     .set_text_element_listener(end_text(move |body: &str| {
//!         sink.borrow_mut().push(body.to_string());
//!         Ok(())
//!     }))?;
//!
//! root.parse_str("<rss><channel><title>News</title></channel></rss>")?;
//! assert_eq!(*titles.borrow(), ["News"]);
//! # Ok::<(), safesax::Error>(())
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::Result;
use crate::attributes::Attributes;

/// Callbacks for an element whose children (if any) are dispatched separately.
#[allow(unused_variables)]
pub trait ElementListener {
    /// Called when the element opens.
    fn start(&mut self, attributes: &Attributes) -> Result<()> {
        Ok(())
    }

    /// Called when the element closes, after all of its children.
    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Callbacks for a leaf element whose text content is collected.
#[allow(unused_variables)]
pub trait TextElementListener {
    /// Called when the element opens.
    fn start(&mut self, attributes: &Attributes) -> Result<()> {
        Ok(())
    }

    /// Called when the element closes with its complete text body
    /// (empty when the element had no character data).
    fn end(&mut self, body: &str) -> Result<()>;
}

/// Shared handle, so callers can inspect a listener after attaching it.
impl<L: ElementListener + ?Sized> ElementListener for Rc<RefCell<L>> {
    fn start(&mut self, attributes: &Attributes) -> Result<()> {
        self.borrow_mut().start(attributes)
    }

    fn end(&mut self) -> Result<()> {
        self.borrow_mut().end()
    }
}

impl<L: TextElementListener + ?Sized> TextElementListener for Rc<RefCell<L>> {
    fn start(&mut self, attributes: &Attributes) -> Result<()> {
        self.borrow_mut().start(attributes)
    }

    fn end(&mut self, body: &str) -> Result<()> {
        self.borrow_mut().end(body)
    }
}

/// Element listener built from two closures. See [`element_fns`].
pub struct FnElementListener<S, E> {
    start: S,
    end: E,
}

impl<S, E> ElementListener for FnElementListener<S, E>
where
    S: FnMut(&Attributes) -> Result<()>,
    E: FnMut() -> Result<()>,
{
    fn start(&mut self, attributes: &Attributes) -> Result<()> {
        (self.start)(attributes)
    }

    fn end(&mut self) -> Result<()> {
        (self.end)()
    }
}

/// Builds an [`ElementListener`] from a start and an end closure.
pub fn element_fns<S, E>(start: S, end: E) -> FnElementListener<S, E>
where
    S: FnMut(&Attributes) -> Result<()>,
    E: FnMut() -> Result<()>,
{
    FnElementListener { start, end }
}

/// Text-element listener that only cares about the body. See [`end_text`].
pub struct EndTextFn<E>(E);

impl<E> TextElementListener for EndTextFn<E>
where
    E: FnMut(&str) -> Result<()>,
{
    fn end(&mut self, body: &str) -> Result<()> {
        (self.0)(body)
    }
}

/// Builds a [`TextElementListener`] from a closure receiving the body.
pub fn end_text<E>(end: E) -> EndTextFn<E>
where
    E: FnMut(&str) -> Result<()>,
{
    EndTextFn(end)
}

/// The listener attached to one schema element.
pub(crate) enum Listener {
    None,
    Element(Box<dyn ElementListener>),
    Text(Box<dyn TextElementListener>),
}

impl Listener {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::None => "no",
            Self::Element(_) => "an element",
            Self::Text(_) => "a text element",
        }
    }

    pub(crate) fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub(crate) fn start(&mut self, attributes: &Attributes) -> Result<()> {
        match self {
            Self::None => Ok(()),
            Self::Element(l) => l.start(attributes),
            Self::Text(l) => l.start(attributes),
        }
    }

    /// `body` ist nur bei Text-Listenern gesetzt.
    pub(crate) fn end(&mut self, body: Option<&str>) -> Result<()> {
        match self {
            Self::None => Ok(()),
            Self::Element(l) => l.end(),
            Self::Text(l) => l.end(body.unwrap_or("")),
        }
    }
}
