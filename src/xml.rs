//! Driver: feeds a document through quick-xml into a [`ContentHandler`].
//!
//! The parser runs namespace-aware: every element and attribute name arrives
//! resolved to (URI, local name), and default namespace declarations are
//! honored. Errors are reported as follows:
//!
//! - I/O failures of the input: [`Error::Io`](crate::Error::Io), keeping the cause.
//! - Well-formedness errors found by quick-xml: [`Error::Xml`](crate::Error::Xml)
//!   with the parser's own error value.
//! - Well-formedness errors found here (unbound prefixes, unknown entities,
//!   forbidden character references): [`Error::MalformedXml`](crate::Error::MalformedXml).
//! - Errors returned by the handler (and so by listeners): unchanged.

use std::io::Read;

use log::debug;

use crate::attributes::Attributes;
use crate::handler::ContentHandler;
use crate::options::ParseOptions;
use crate::qname::QName;
use crate::Result;

mod dtd;
mod emit;
use emit::emit_xml_events;

/// Internes Event zwischen Parser-Schleife und Handler. Borrowed, kein Rc.
pub(crate) enum XmlEvent<'a> {
    StartDocument,
    EndDocument,
    StartElement {
        name: &'a QName,
        attributes: &'a Attributes,
    },
    EndElement(&'a QName),
    Characters(&'a str),
    Comment(&'a str),
    ProcessingInstruction { target: &'a str, data: &'a str },
}

/// Parses a document from `reader` with default options.
///
/// # Errors
///
/// See the [module documentation](self).
pub fn parse<H: ContentHandler + ?Sized>(reader: impl Read, handler: &mut H) -> Result<()> {
    parse_with_options(reader, &ParseOptions::default(), handler)
}

/// Parses a document held in memory.
pub fn parse_str<H: ContentHandler + ?Sized>(xml: &str, handler: &mut H) -> Result<()> {
    parse(xml.as_bytes(), handler)
}

/// Parses a document from `reader` with explicit options.
pub fn parse_with_options<H: ContentHandler + ?Sized>(
    reader: impl Read,
    options: &ParseOptions,
    handler: &mut H,
) -> Result<()> {
    debug!("parse started ({options:?})");
    handler.set_options(options);
    let result = emit_xml_events(reader, options, |position, event| {
        handler.set_position(position);
        dispatch(handler, event)
    });
    match &result {
        Ok(()) => debug!("parse finished"),
        Err(e) => debug!("parse aborted: {e}"),
    }
    result
}

fn dispatch<H: ContentHandler + ?Sized>(handler: &mut H, event: XmlEvent<'_>) -> Result<()> {
    match event {
        XmlEvent::StartDocument => handler.start_document(),
        XmlEvent::EndDocument => handler.end_document(),
        XmlEvent::StartElement { name, attributes } => handler.start_element(name, attributes),
        XmlEvent::EndElement(name) => handler.end_element(name),
        XmlEvent::Characters(text) => handler.characters(text),
        XmlEvent::Comment(text) => handler.comment(text),
        XmlEvent::ProcessingInstruction { target, data } => {
            handler.processing_instruction(target, data)
        }
    }
}

/// Yields `data`, then fails every further read.
#[cfg(test)]
pub(crate) struct FailingReader<'a> {
    pub(crate) data: &'a [u8],
}

#[cfg(test)]
impl Read for FailingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.data.is_empty() {
            return Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "stream reset"));
        }
        let n = self.data.len().min(buf.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::Error;

    /// Zählt Events pro Art.
    #[derive(Default)]
    struct Tally {
        documents: usize,
        starts: Vec<String>,
        ends: usize,
        text: String,
        comments: usize,
        pis: usize,
        last_position: u64,
    }

    impl ContentHandler for Tally {
        fn set_position(&mut self, position: u64) {
            self.last_position = position;
        }
        fn start_document(&mut self) -> Result<()> {
            self.documents += 1;
            Ok(())
        }
        fn start_element(&mut self, name: &QName, _attributes: &Attributes) -> Result<()> {
            self.starts.push(name.to_string());
            Ok(())
        }
        fn end_element(&mut self, _name: &QName) -> Result<()> {
            self.ends += 1;
            Ok(())
        }
        fn characters(&mut self, text: &str) -> Result<()> {
            self.text.push_str(text);
            Ok(())
        }
        fn comment(&mut self, _text: &str) -> Result<()> {
            self.comments += 1;
            Ok(())
        }
        fn processing_instruction(&mut self, _target: &str, _data: &str) -> Result<()> {
            self.pis += 1;
            Ok(())
        }
    }

    #[test]
    fn dispatches_all_event_kinds() {
        let mut tally = Tally::default();
        parse_str("<!--x--><a xmlns='urn:a'><?p?>t<b/>u</a>", &mut tally).unwrap();
        assert_eq!(tally.documents, 1);
        assert_eq!(tally.starts, ["{urn:a}a", "{urn:a}b"]);
        assert_eq!(tally.ends, 2);
        assert_eq!(tally.text, "tu");
        assert_eq!(tally.comments, 1);
        assert_eq!(tally.pis, 1);
        assert!(tally.last_position > 0);
    }

    #[test]
    fn io_failure_is_wrapped_with_cause() {
        let mut tally = Tally::default();
        let reader = FailingReader { data: b"<a><b>" };
        let err = parse(reader, &mut tally).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "{err}");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("stream reset"));
    }

    #[test]
    fn truncated_document_fails() {
        let mut tally = Tally::default();
        assert!(parse_str("<a><b>", &mut tally).is_err());
    }

    #[test]
    fn options_reach_handler() {
        #[derive(Default)]
        struct Trimmed(Option<bool>);

        impl ContentHandler for Trimmed {
            fn set_options(&mut self, options: &ParseOptions) {
                self.0 = Some(options.trim_text());
            }
            fn start_element(&mut self, _name: &QName, _attributes: &Attributes) -> Result<()> {
                Ok(())
            }
            fn end_element(&mut self, _name: &QName) -> Result<()> {
                Ok(())
            }
            fn characters(&mut self, _text: &str) -> Result<()> {
                Ok(())
            }
        }

        let mut handler = Trimmed::default();
        let opts = ParseOptions::default().with_trim_text(true);
        parse_with_options("<a/>".as_bytes(), &opts, &mut handler).unwrap();
        assert_eq!(handler.0, Some(true));
    }

    #[test]
    fn text_is_delivered_untrimmed() {
        let mut tally = Tally::default();
        let opts = ParseOptions::default().with_trim_text(true);
        parse_with_options("<a>  x &amp; y  </a>".as_bytes(), &opts, &mut tally).unwrap();
        assert_eq!(tally.text, "  x & y  ");
    }

    #[test]
    fn end_names_unchecked() {
        let mut tally = Tally::default();
        let opts = ParseOptions::default().with_check_end_names(false);
        parse_with_options("<a><b></c></a>".as_bytes(), &opts, &mut tally).unwrap();
        assert_eq!(tally.ends, 2);
    }

    #[test]
    fn works_through_trait_object() {
        let mut tally = Tally::default();
        let handler: &mut dyn ContentHandler = &mut tally;
        parse_str("<a/>", handler).unwrap();
        assert_eq!(tally.starts, ["a"]);
    }
}
