//! The schema tree: expected elements and the listeners attached to them.
//!
//! A schema is built top-down from a [`RootElement`]. Every node owns its
//! children, keyed by [`QName`]; a node is reachable from exactly one root
//! and there are no parent links. Children declared without a namespace
//! inherit the namespace of their parent.
//!
//! ```
//! use safesax::RootElement;
//!
//! const ATOM: &str = "http://www.w3.org/2005/Atom";
//!
//! let mut root = RootElement::new(ATOM, "feed");
//! let entry = root.require_child("entry")?;
//! entry.require_child("id")?;
//! assert_eq!(entry.name().uri(), ATOM);
//! assert!(root.get_child("entry")?.is_required());
//! # Ok::<(), safesax::Error>(())
//! ```

use std::cell::RefCell;
use std::fmt;
use std::io::Read;
use std::ops::{Deref, DerefMut};

use log::debug;

use crate::attributes::Attributes;
use crate::handler::SchemaHandler;
use crate::listener::{ElementListener, Listener, TextElementListener};
use crate::options::ParseOptions;
use crate::qname::QName;
use crate::{Error, FastHashSet, FastIndexMap, Result};

/// One expected element in the schema.
pub struct Element {
    name: QName,
    /// Insertion order is kept so the first missing required child is deterministic.
    children: FastIndexMap<QName, Element>,
    required: bool,
    /// Cached `listener.is_text()`; readable while a listener is running.
    text_leaf: bool,
    listener: RefCell<Listener>,
}

impl Element {
    pub(crate) fn new(name: QName) -> Self {
        Self {
            name,
            children: FastIndexMap::default(),
            required: false,
            text_leaf: false,
            listener: RefCell::new(Listener::None),
        }
    }

    // --- Builder ---

    /// Returns the child with the given local name in this element's
    /// namespace, creating an optional child if it does not exist yet.
    ///
    /// # Errors
    ///
    /// [`Error::ChildOfTextElement`] if this element has a text-element listener.
    pub fn get_child(&mut self, local_name: &str) -> Result<&mut Element> {
        let name = self.name.sibling(local_name);
        self.child_entry(name)
    }

    /// Returns the child with the given namespace and local name, creating an
    /// optional child if it does not exist yet.
    ///
    /// # Errors
    ///
    /// [`Error::ChildOfTextElement`] if this element has a text-element listener.
    pub fn get_child_ns(&mut self, uri: &str, local_name: &str) -> Result<&mut Element> {
        self.child_entry(QName::new(uri, local_name))
    }

    /// Like [`get_child`](Self::get_child), but marks the child required.
    ///
    /// Required sticks: a later `get_child` for the same name does not undo it.
    pub fn require_child(&mut self, local_name: &str) -> Result<&mut Element> {
        let child = self.get_child(local_name)?;
        child.required = true;
        Ok(child)
    }

    /// Like [`get_child_ns`](Self::get_child_ns), but marks the child required.
    pub fn require_child_ns(&mut self, uri: &str, local_name: &str) -> Result<&mut Element> {
        let child = self.get_child_ns(uri, local_name)?;
        child.required = true;
        Ok(child)
    }

    fn child_entry(&mut self, name: QName) -> Result<&mut Element> {
        if self.text_leaf {
            return Err(Error::ChildOfTextElement {
                element: self.name.clone(),
                child: name,
            });
        }
        Ok(self
            .children
            .entry(name)
            .or_insert_with_key(|name| Element::new(name.clone())))
    }

    /// Attaches an element listener, replacing a previous element listener.
    ///
    /// # Errors
    ///
    /// [`Error::ListenerConflict`] if a text-element listener is attached.
    pub fn set_element_listener(
        &mut self,
        listener: impl ElementListener + 'static,
    ) -> Result<&mut Self> {
        let slot = self.listener.get_mut();
        match *slot {
            Listener::Text(_) => {
                return Err(Error::ListenerConflict {
                    element: self.name.clone(),
                    existing: slot.kind(),
                });
            }
            Listener::Element(_) => debug!("replacing element listener of '{}'", self.name),
            Listener::None => {}
        }
        *slot = Listener::Element(Box::new(listener));
        Ok(self)
    }

    /// Attaches a text-element listener, replacing a previous text-element
    /// listener. The element becomes a leaf: no children can be added.
    ///
    /// # Errors
    ///
    /// [`Error::ListenerConflict`] if an element listener is attached,
    /// [`Error::TextElementWithChildren`] if children were already declared.
    pub fn set_text_element_listener(
        &mut self,
        listener: impl TextElementListener + 'static,
    ) -> Result<&mut Self> {
        if !self.children.is_empty() {
            return Err(Error::TextElementWithChildren {
                element: self.name.clone(),
            });
        }
        let slot = self.listener.get_mut();
        match *slot {
            Listener::Element(_) => {
                return Err(Error::ListenerConflict {
                    element: self.name.clone(),
                    existing: slot.kind(),
                });
            }
            Listener::Text(_) => debug!("replacing text element listener of '{}'", self.name),
            Listener::None => {}
        }
        *slot = Listener::Text(Box::new(listener));
        self.text_leaf = slot.is_text();
        Ok(self)
    }

    // --- Accessors ---

    /// The name this element matches.
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Whether the parent must contain this element at least once.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether this element has a text-element listener.
    pub fn is_text_leaf(&self) -> bool {
        self.text_leaf
    }

    /// Whether any listener is attached.
    pub fn has_listener(&self) -> bool {
        self.listener
            .try_borrow()
            .map_or(true, |l| !matches!(*l, Listener::None))
    }

    /// Looks up a declared child.
    pub fn child(&self, name: &QName) -> Option<&Element> {
        self.children.get(name)
    }

    /// Iterates over declared children in declaration order.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.values()
    }

    // --- Dispatch ---

    /// First declared required child not contained in `seen`.
    pub(crate) fn missing_required_child(&self, seen: &FastHashSet<QName>) -> Option<&QName> {
        self.children
            .values()
            .filter(|c| c.required)
            .map(|c| &c.name)
            .find(|name| !seen.contains(*name))
    }

    pub(crate) fn fire_start(&self, attributes: &Attributes) -> Result<()> {
        self.listener_mut()?.start(attributes)
    }

    pub(crate) fn fire_end(&self, body: Option<&str>) -> Result<()> {
        self.listener_mut()?.end(body)
    }

    fn listener_mut(&self) -> Result<std::cell::RefMut<'_, Listener>> {
        self.listener.try_borrow_mut().map_err(|_| Error::ListenerBusy {
            element: self.name.clone(),
        })
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listener = self
            .listener
            .try_borrow()
            .map_or("busy", |l| l.kind());
        f.debug_struct("Element")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("listener", &listener)
            .field("children", &self.children.values().collect::<Vec<_>>())
            .finish()
    }
}

/// The anchor of a schema. Dereferences to its [`Element`], so all builder
/// methods are available on it, and hands out event handlers for parsing.
#[derive(Debug)]
pub struct RootElement {
    element: Element,
}

impl RootElement {
    /// Creates a root matching the document element `{uri}local_name`.
    pub fn new(uri: &str, local_name: &str) -> Self {
        Self::from_qname(QName::new(uri, local_name))
    }

    /// Creates a root matching the given document element name.
    pub fn from_qname(name: QName) -> Self {
        Self {
            element: Element::new(name),
        }
    }

    /// A fresh parse state bound to this schema, for exactly one document.
    ///
    /// The schema stays borrowed (and thus frozen) while the handler lives.
    pub fn content_handler(&self) -> SchemaHandler<'_> {
        SchemaHandler::new(self)
    }

    /// Parses a document from `reader`, dispatching to this schema's listeners.
    pub fn parse(&self, reader: impl Read) -> Result<()> {
        self.parse_with_options(reader, &ParseOptions::default())
    }

    /// Like [`parse`](Self::parse) with explicit parser options.
    pub fn parse_with_options(&self, reader: impl Read, options: &ParseOptions) -> Result<()> {
        let mut handler = self.content_handler();
        crate::xml::parse_with_options(reader, options, &mut handler)
    }

    /// Parses a document held in memory.
    pub fn parse_str(&self, xml: &str) -> Result<()> {
        self.parse(xml.as_bytes())
    }

    pub(crate) fn element(&self) -> &Element {
        &self.element
    }
}

impl Deref for RootElement {
    type Target = Element;

    fn deref(&self) -> &Element {
        &self.element
    }
}

impl DerefMut for RootElement {
    fn deref_mut(&mut self) -> &mut Element {
        &mut self.element
    }
}
