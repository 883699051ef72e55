//! Namespace-qualified names.
//!
//! A [`QName`] is the pair (namespace URI, local name). Prefixes never take
//! part in matching: the parser resolves them before events reach the
//! schema, so two names are equal exactly when both components are equal.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use ahash::AHasher;

/// Fully-qualified element or attribute name.
///
/// The empty URI denotes the no-namespace name; it is an ordinary value and
/// never matches a non-empty URI.
#[derive(Clone)]
pub struct QName {
    uri: Rc<str>,
    local_name: Rc<str>,
    /// Vorberechneter Hash von (uri, local_name) für die Kind-Tabellen.
    identity: u64,
}

/// Berechnet den Identity-Hash für ein QName (uri + local_name).
pub(crate) fn compute_identity(uri: &str, local_name: &str) -> u64 {
    let mut hasher = AHasher::default();
    uri.hash(&mut hasher);
    local_name.hash(&mut hasher);
    hasher.finish()
}

impl QName {
    /// Creates a name from a namespace URI and a local name.
    pub fn new(uri: impl Into<Rc<str>>, local_name: impl Into<Rc<str>>) -> Self {
        let uri = uri.into();
        let local_name = local_name.into();
        let identity = compute_identity(&uri, &local_name);
        Self {
            uri,
            local_name,
            identity,
        }
    }

    /// Creates a name in the no-namespace.
    pub fn local(local_name: impl Into<Rc<str>>) -> Self {
        Self::new("", local_name)
    }

    /// Parses Clark notation: `{uri}local` or a bare `local`.
    ///
    /// Returns `None` for an unterminated `{`, or an empty local name.
    pub fn from_clark(s: &str) -> Option<Self> {
        let (uri, local) = match s.strip_prefix('{') {
            Some(rest) => {
                let end = rest.find('}')?;
                (&rest[..end], &rest[end + 1..])
            }
            None => ("", s),
        };
        if local.is_empty() || local.contains(['{', '}']) {
            return None;
        }
        Some(Self::new(uri, local))
    }

    /// The namespace URI, empty for the no-namespace.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The local part of the name.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Whether the name has no namespace.
    pub fn is_unqualified(&self) -> bool {
        self.uri.is_empty()
    }

    /// Compares against borrowed components without building a `QName`.
    #[inline]
    pub fn matches(&self, uri: &str, local_name: &str) -> bool {
        &*self.uri == uri && &*self.local_name == local_name
    }

    /// A name in the same namespace with a different local part.
    pub(crate) fn sibling(&self, local_name: &str) -> Self {
        let local_name: Rc<str> = Rc::from(local_name);
        let identity = compute_identity(&self.uri, &local_name);
        Self {
            uri: Rc::clone(&self.uri),
            local_name,
            identity,
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.uri == other.uri
            && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

/// Sortierung: erst local_name, dann uri.
impl PartialOrd for QName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.local_name
            .cmp(&other.local_name)
            .then_with(|| self.uri.cmp(&other.uri))
    }
}

impl fmt::Debug for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QName")
            .field("uri", &self.uri)
            .field("local_name", &self.local_name)
            .finish()
    }
}

/// Clark notation: `{uri}local`, or just `local` without a namespace.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uri.is_empty() {
            f.write_str(&self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.uri, self.local_name)
        }
    }
}
