//! Read-only attribute view handed to listeners.

use crate::FastIndexMap;
use crate::qname::QName;

/// The attributes of one start tag, keyed by resolved [`QName`].
///
/// Values are unescaped. Namespace declarations (`xmlns`, `xmlns:*`) are not
/// included. Unprefixed attributes have no namespace, regardless of any
/// default namespace in scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: FastIndexMap<QName, String>,
}

impl Attributes {
    /// An empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: QName, value: String) -> Option<String> {
        self.entries.insert(name, value)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Looks up a value by namespace URI and local name.
    pub fn get(&self, uri: &str, local_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name.matches(uri, local_name))
            .map(|(_, value)| value.as_str())
    }

    /// Looks up a value by name.
    pub fn get_qname(&self, name: &QName) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&QName, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the start tag had no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(QName, String)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (QName, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
