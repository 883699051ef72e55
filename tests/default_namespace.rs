//! Integrationstests: Namespace-Vererbung und -Override zwischen Schema und Dokument.

use std::cell::RefCell;
use std::rc::Rc;

use safesax::{Attributes, ElementListener, Error, QName, Result, RootElement, TextElementListener};

const ATOM: &str = "http://www.w3.org/2005/Atom";
const OTHER: &str = "http://www.other.com";

// ============================================================================
// Hilfsfunktionen
// ============================================================================

#[derive(Default)]
struct ElementCounter {
    starts: usize,
    ends: usize,
}

impl ElementListener for ElementCounter {
    fn start(&mut self, _attributes: &Attributes) -> Result<()> {
        self.starts += 1;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ends += 1;
        Ok(())
    }
}

#[derive(Default)]
struct TextElementCounter {
    starts: usize,
    bodies: String,
}

impl TextElementListener for TextElementCounter {
    fn start(&mut self, _attributes: &Attributes) -> Result<()> {
        self.starts += 1;
        Ok(())
    }

    fn end(&mut self, body: &str) -> Result<()> {
        self.bodies.push_str(body);
        Ok(())
    }
}

fn counter<T: Default>() -> Rc<RefCell<T>> {
    Rc::new(RefCell::new(T::default()))
}

const SAME_NAMESPACE: &str = "<feed xmlns='http://www.w3.org/2005/Atom'>\n\
    <entry>\n\
    <id>a</id>\n\
    </entry>\n\
    <entry>\n\
    <id>b</id>\n\
    </entry>\n\
    </feed>\n";

const OVERRIDDEN_NAMESPACE: &str = "<feed xmlns='http://www.w3.org/2005/Atom'>\n\
    <entry xmlns='http://www.other.com'>\n\
    <id>a</id>\n\
    </entry>\n\
    <entry>\n\
    <id>b</id>\n\
    </entry>\n\
    </feed>\n";

/// Root `feed` with `entry/id` in the Atom namespace, optional or required.
fn atom_schema(
    required: bool,
    root_counter: &Rc<RefCell<ElementCounter>>,
    entry_counter: &Rc<RefCell<ElementCounter>>,
    id_counter: &Rc<RefCell<TextElementCounter>>,
) -> RootElement {
    let mut root = RootElement::new(ATOM, "feed");
    root.set_element_listener(Rc::clone(root_counter)).unwrap();
    let entry = if required {
        root.require_child("entry").unwrap()
    } else {
        root.get_child("entry").unwrap()
    };
    entry.set_element_listener(Rc::clone(entry_counter)).unwrap();
    let id = if required {
        entry.require_child("id").unwrap()
    } else {
        entry.get_child("id").unwrap()
    };
    id.set_text_element_listener(Rc::clone(id_counter)).unwrap();
    root
}

/// Adds `{other}entry/id` to `root`, optional or required.
fn add_other_namespace(
    root: &mut RootElement,
    required: bool,
    entry_counter: &Rc<RefCell<ElementCounter>>,
    id_counter: &Rc<RefCell<TextElementCounter>>,
) {
    let entry = if required {
        root.require_child_ns(OTHER, "entry").unwrap()
    } else {
        root.get_child_ns(OTHER, "entry").unwrap()
    };
    entry.set_element_listener(Rc::clone(entry_counter)).unwrap();
    let id = if required {
        entry.require_child("id").unwrap()
    } else {
        entry.get_child("id").unwrap()
    };
    id.set_text_element_listener(Rc::clone(id_counter)).unwrap();
}

// ============================================================================
// Szenarien
// ============================================================================

#[test]
fn default_namespace_set_for_all_optional_elements() {
    let (root_counter, entry_counter, id_counter) = (counter(), counter(), counter());
    let root = atom_schema(false, &root_counter, &entry_counter, &id_counter);

    root.parse_str(SAME_NAMESPACE).unwrap();

    assert_eq!(root_counter.borrow().starts, 1);
    assert_eq!(root_counter.borrow().ends, 1);
    assert_eq!(entry_counter.borrow().starts, 2);
    assert_eq!(entry_counter.borrow().ends, 2);
    assert_eq!(id_counter.borrow().starts, 2);
    assert_eq!(id_counter.borrow().bodies, "ab");
}

#[test]
fn default_namespace_overridden_in_optional_element() {
    let (root_counter, entry_counter, id_counter) = (counter(), counter(), counter());
    let mut root = atom_schema(false, &root_counter, &entry_counter, &id_counter);
    let (other_entry_counter, other_id_counter) = (counter(), counter());
    add_other_namespace(&mut root, false, &other_entry_counter, &other_id_counter);

    root.parse_str(OVERRIDDEN_NAMESPACE).unwrap();

    assert_eq!(root_counter.borrow().starts, 1);
    assert_eq!(root_counter.borrow().ends, 1);
    assert_eq!(entry_counter.borrow().starts, 1);
    assert_eq!(entry_counter.borrow().ends, 1);
    assert_eq!(other_entry_counter.borrow().starts, 1);
    assert_eq!(other_entry_counter.borrow().ends, 1);
    assert_eq!(id_counter.borrow().starts, 1);
    assert_eq!(id_counter.borrow().bodies, "b");
    assert_eq!(other_id_counter.borrow().starts, 1);
    assert_eq!(other_id_counter.borrow().bodies, "a");
}

#[test]
fn default_namespace_set_for_all_required_elements() {
    let (root_counter, entry_counter, id_counter) = (counter(), counter(), counter());
    let root = atom_schema(true, &root_counter, &entry_counter, &id_counter);

    root.parse_str(SAME_NAMESPACE).unwrap();

    assert_eq!(root_counter.borrow().starts, 1);
    assert_eq!(root_counter.borrow().ends, 1);
    assert_eq!(entry_counter.borrow().starts, 2);
    assert_eq!(entry_counter.borrow().ends, 2);
    assert_eq!(id_counter.borrow().starts, 2);
    assert_eq!(id_counter.borrow().bodies, "ab");
}

#[test]
fn required_child_missing_is_reported_at_parent_close() {
    let (root_counter, entry_counter, id_counter) = (counter(), counter(), counter());
    let root = atom_schema(true, &root_counter, &entry_counter, &id_counter);

    let xml = "<feed xmlns='http://www.w3.org/2005/Atom'>\n\
        <entry>\n\
        <title>no id</title>\n\
        </entry>\n\
        </feed>\n";
    let err = root.parse_str(xml).unwrap_err();

    match err {
        Error::MissingRequiredChild { parent, child, .. } => {
            assert_eq!(parent, QName::new(ATOM, "entry"));
            assert_eq!(child, QName::new(ATOM, "id"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(entry_counter.borrow().starts, 1);
    assert_eq!(entry_counter.borrow().ends, 0);
    assert_eq!(root_counter.borrow().ends, 0);
}

#[test]
fn required_child_missing_in_empty_entry() {
    let (root_counter, entry_counter, id_counter) = (counter(), counter(), counter());
    let root = atom_schema(true, &root_counter, &entry_counter, &id_counter);

    let xml = "<feed xmlns='http://www.w3.org/2005/Atom'>\n<entry/>\n</feed>\n";
    let err = root.parse_str(xml).unwrap_err();

    match err {
        Error::MissingRequiredChild { parent, child, .. } => {
            assert_eq!(parent, QName::new(ATOM, "entry"));
            assert_eq!(child, QName::new(ATOM, "id"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(entry_counter.borrow().starts, 1);
    assert_eq!(id_counter.borrow().starts, 0);
}

#[test]
fn default_namespace_overridden_in_required_element() {
    let (root_counter, entry_counter, id_counter) = (counter(), counter(), counter());
    let mut root = atom_schema(true, &root_counter, &entry_counter, &id_counter);
    let (other_entry_counter, other_id_counter) = (counter(), counter());
    add_other_namespace(&mut root, true, &other_entry_counter, &other_id_counter);

    root.parse_str(OVERRIDDEN_NAMESPACE).unwrap();

    assert_eq!(root_counter.borrow().starts, 1);
    assert_eq!(root_counter.borrow().ends, 1);
    assert_eq!(entry_counter.borrow().starts, 1);
    assert_eq!(entry_counter.borrow().ends, 1);
    assert_eq!(other_entry_counter.borrow().starts, 1);
    assert_eq!(other_entry_counter.borrow().ends, 1);
    assert_eq!(id_counter.borrow().starts, 1);
    assert_eq!(id_counter.borrow().bodies, "b");
    assert_eq!(other_id_counter.borrow().starts, 1);
    assert_eq!(other_id_counter.borrow().bodies, "a");
}

#[test]
fn namespace_mismatch_fires_no_callbacks() {
    let (root_counter, entry_counter, id_counter) = (counter(), counter(), counter());
    let root = atom_schema(false, &root_counter, &entry_counter, &id_counter);

    let xml = SAME_NAMESPACE.replace(ATOM, "http://example.org/not-atom");
    root.parse_str(&xml).unwrap();

    assert_eq!(root_counter.borrow().starts, 0);
    assert_eq!(root_counter.borrow().ends, 0);
    assert_eq!(entry_counter.borrow().starts, 0);
    assert_eq!(id_counter.borrow().starts, 0);
    assert_eq!(id_counter.borrow().bodies, "");
}
