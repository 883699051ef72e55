//! Event sink and the schema-directed parse state.
//!
//! [`ContentHandler`] is what the driver feeds: start/end/characters events
//! with namespaces already resolved. [`SchemaHandler`] implements it by
//! walking an explicit stack of frames against the schema tree and firing at
//! most one listener call per event.

use log::{debug, trace, warn};

use crate::attributes::Attributes;
use crate::element::{Element, RootElement};
use crate::options::ParseOptions;
use crate::qname::QName;
use crate::{Error, FastHashSet, Result};

/// Receiver of namespace-resolved parse events.
///
/// Every callback may fail; the driver stops at the first error and returns it.
#[allow(unused_variables)]
pub trait ContentHandler {
    /// Options of the parse about to start; called before `start_document`.
    fn set_options(&mut self, options: &ParseOptions) {}

    /// Byte offset of the event about to be delivered.
    fn set_position(&mut self, position: u64) {}

    /// Called once before any other event.
    fn start_document(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once after the last event.
    fn end_document(&mut self) -> Result<()> {
        Ok(())
    }

    /// An element opened.
    fn start_element(&mut self, name: &QName, attributes: &Attributes) -> Result<()>;

    /// The most recently opened element closed.
    fn end_element(&mut self, name: &QName) -> Result<()>;

    /// A chunk of character data. Adjacent chunks belong to the same text run.
    fn characters(&mut self, text: &str) -> Result<()>;

    /// A processing instruction.
    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        Ok(())
    }

    /// A comment.
    fn comment(&mut self, text: &str) -> Result<()> {
        Ok(())
    }
}

impl<H: ContentHandler + ?Sized> ContentHandler for &mut H {
    fn set_options(&mut self, options: &ParseOptions) {
        (**self).set_options(options);
    }
    fn set_position(&mut self, position: u64) {
        (**self).set_position(position);
    }
    fn start_document(&mut self) -> Result<()> {
        (**self).start_document()
    }
    fn end_document(&mut self) -> Result<()> {
        (**self).end_document()
    }
    fn start_element(&mut self, name: &QName, attributes: &Attributes) -> Result<()> {
        (**self).start_element(name, attributes)
    }
    fn end_element(&mut self, name: &QName) -> Result<()> {
        (**self).end_element(name)
    }
    fn characters(&mut self, text: &str) -> Result<()> {
        (**self).characters(text)
    }
    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        (**self).processing_instruction(target, data)
    }
    fn comment(&mut self, text: &str) -> Result<()> {
        (**self).comment(text)
    }
}

/// One open input element.
enum Frame<'a> {
    /// The element matched `element` at this position of the schema.
    Matched {
        element: &'a Element,
        depth: usize,
        /// Nur bei Text-Listenern vorhanden.
        text: Option<String>,
        /// Required children seen so far.
        seen: FastHashSet<QName>,
    },
    /// The element (and so its whole subtree) is not part of the schema.
    Unknown { depth: usize },
}

/// Parse state for one document, bound to a schema.
///
/// Created by [`RootElement::content_handler`]. Unknown subtrees are skipped
/// without callbacks; a second document-level element is treated as unknown.
pub struct SchemaHandler<'a> {
    root: &'a RootElement,
    stack: Vec<Frame<'a>>,
    root_handled: bool,
    /// Text-Bodies beim Schließen trimmen.
    trim_text: bool,
    position: u64,
}

impl<'a> SchemaHandler<'a> {
    pub(crate) fn new(root: &'a RootElement) -> Self {
        Self {
            root,
            stack: Vec::with_capacity(16),
            root_handled: false,
            trim_text: false,
            position: 0,
        }
    }

    /// Number of currently open input elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether the document element matched the root of the schema.
    pub fn root_handled(&self) -> bool {
        self.root_handled
    }

    /// Finds the schema node for a new element, recording it as seen in its parent.
    fn match_element(&mut self, name: &QName) -> Option<&'a Element> {
        let depth = self.stack.len() + 1;
        match self.stack.last_mut() {
            None => {
                let root: &'a Element = self.root.element();
                if !self.root_handled && root.name() == name {
                    self.root_handled = true;
                    Some(root)
                } else {
                    debug!("skipping document element '{name}' (expected '{}')", root.name());
                    None
                }
            }
            Some(Frame::Unknown { .. }) => None,
            Some(Frame::Matched { element, seen, .. }) => {
                let parent: &'a Element = *element;
                match parent.child(name) {
                    Some(child) => {
                        if child.is_required() {
                            seen.insert(name.clone());
                        }
                        Some(child)
                    }
                    None if parent.is_text_leaf() => {
                        warn!(
                            "element '{name}' inside text element '{}' at depth {depth} ignored",
                            parent.name()
                        );
                        None
                    }
                    None => {
                        debug!("skipping unknown element '{name}' at depth {depth}");
                        None
                    }
                }
            }
        }
    }
}

impl ContentHandler for SchemaHandler<'_> {
    fn set_options(&mut self, options: &ParseOptions) {
        self.trim_text = options.trim_text();
    }

    fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    /// Resets the parse state, so one handler can drive sequential documents.
    fn start_document(&mut self) -> Result<()> {
        self.stack.clear();
        self.root_handled = false;
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(Error::IllFormedDocument {
                open_elements: self.stack.len(),
            });
        }
        if !self.root_handled {
            debug!("document element never matched '{}'", self.root.name());
        }
        Ok(())
    }

    fn start_element(&mut self, name: &QName, attributes: &Attributes) -> Result<()> {
        let depth = self.stack.len() + 1;
        match self.match_element(name) {
            Some(element) => {
                self.stack.push(Frame::Matched {
                    element,
                    depth,
                    text: element.is_text_leaf().then(String::new),
                    seen: FastHashSet::default(),
                });
                trace!("start '{name}' at depth {depth}");
                element.fire_start(attributes)
            }
            None => {
                self.stack.push(Frame::Unknown { depth });
                Ok(())
            }
        }
    }

    fn end_element(&mut self, name: &QName) -> Result<()> {
        let Some(frame) = self.stack.pop() else {
            return Err(Error::malformed(
                format!("end tag '{name}' without open element"),
                self.position,
            ));
        };
        match frame {
            Frame::Unknown { depth } => {
                trace!("leaving unknown element '{name}' at depth {depth}");
                Ok(())
            }
            Frame::Matched {
                element,
                depth,
                text,
                seen,
            } => {
                if let Some(missing) = element.missing_required_child(&seen) {
                    return Err(Error::MissingRequiredChild {
                        parent: element.name().clone(),
                        child: missing.clone(),
                        position: self.position,
                    });
                }
                trace!("end '{}' at depth {depth}", element.name());
                let body = match text.as_deref() {
                    Some(body) if self.trim_text => Some(body.trim()),
                    body => body,
                };
                element.fire_end(body)
            }
        }
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        if let Some(Frame::Matched { text: Some(buf), .. }) = self.stack.last_mut() {
            buf.push_str(text);
        }
        Ok(())
    }
}
