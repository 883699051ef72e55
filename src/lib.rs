//! safesax: schema-directed dispatch over a streaming, namespace-aware XML parser
//!
//! A schema is a tree of expected elements rooted at a [`RootElement`].
//! Listeners attached to its nodes are called as matching elements stream
//! past; everything the schema does not mention is skipped.
//!
//! # Beispiel
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use safesax::RootElement;
//! use safesax::listener::end_text;
//!
//! const ATOM: &str = "http://www.w3.org/2005/Atom";
//!
//! let titles = Rc::new(RefCell::new(Vec::new()));
//! let mut root = RootElement::new(ATOM, "feed");
//! let sink = Rc::clone(&titles);
//! root.get_child("entry")?
//!     .require_child("title")?
//!     .set_text_element_listener(end_text(move |body: &str| {
//!         sink.borrow_mut().push(body.to_string());
//!         Ok(())
//!     }))?;
//!
//! root.parse_str(concat!(
//!     "<feed xmlns='http://www.w3.org/2005/Atom'>",
//!     "<entry><title>One</title></entry>",
//!     "<author><title>ignored</title></author>",
//!     "<entry><title>Two</title></entry>",
//!     "</feed>",
//! ))?;
//! assert_eq!(*titles.borrow(), ["One", "Two"]);
//! # Ok::<(), safesax::Error>(())
//! ```

pub mod attributes;
pub mod element;
pub mod error;
pub mod handler;
pub mod listener;
pub mod options;
pub mod qname;
pub mod xml;

pub use error::{Error, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent; nur für interne Datenstrukturen).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// HashSet mit ahash.
pub(crate) type FastHashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;

/// IndexMap mit ahash (deterministische Iteration + schnelles Hashing).
pub(crate) type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

// Public API: Schema
pub use element::{Element, RootElement};
pub use listener::{ElementListener, TextElementListener};

// Public API: Types
pub use attributes::Attributes;
pub use options::ParseOptions;
pub use qname::QName;

// Public API: Parsing
pub use handler::{ContentHandler, SchemaHandler};
pub use xml::{parse, parse_str, parse_with_options};
