use std::borrow::Cow;
use std::io::BufRead;

use memchr::memchr;
use quick_xml::events::{BytesCData, BytesStart, BytesText, Event};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use super::XmlEvent;
use super::dtd::entity_declarations;
use crate::attributes::Attributes;
use crate::options::ParseOptions;
use crate::qname::{QName, compute_identity};
use crate::{Error, FastHashMap, Result};

/// Obergrenze fuer den expandierten Wert einer DTD-Entity.
const MAX_ENTITY_EXPANSION: usize = 1 << 20;

/// Per-document scratch state of the event pump.
#[derive(Default)]
struct DocumentState {
    /// Offene Elemente; End-Events verwenden den QName des Start-Tags.
    open: Vec<QName>,
    /// QName-Pool: wiederkehrende Namen ohne neue Rc<str>-Allokation.
    qname_pool: FastHashMap<u64, QName>,
    attributes: Attributes,
    /// Interne DTD-Entities, bereits expandiert.
    entities: FastHashMap<String, String>,
    /// Pending character data: Text, Referenzen und CDATA bis zum naechsten Markup.
    text: String,
    text_start: u64,
}

/// Drives quick-xml over `xml_reader` and hands every event to `emit`
/// together with the byte offset where it starts.
///
/// Adjacent text, references and CDATA sections are coalesced into one
/// `Characters` event per text run.
pub(crate) fn emit_xml_events(
    xml_reader: impl std::io::Read,
    options: &ParseOptions,
    mut emit: impl FnMut(u64, XmlEvent<'_>) -> Result<()>,
) -> Result<()> {
    let mut reader = NsReader::from_reader(std::io::BufReader::new(xml_reader));
    {
        let config = reader.config_mut();
        config.check_end_names = options.check_end_names();
        config.expand_empty_elements = true;
    }

    let mut buf = Vec::new();
    let mut state = DocumentState::default();

    emit(0, XmlEvent::StartDocument)?;

    loop {
        let position = reader.buffer_position();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                flush_text(&mut state, &mut emit)?;
                let name = start_element(&reader, &e, position, options.max_depth(), &mut state)?;
                emit(position, XmlEvent::StartElement { name: &name, attributes: &state.attributes })?;
                state.open.push(name);
            }
            Ok(Event::Empty(e)) => {
                // Nur ohne expand_empty_elements; der Vollstaendigkeit halber.
                flush_text(&mut state, &mut emit)?;
                let name = start_element(&reader, &e, position, options.max_depth(), &mut state)?;
                emit(position, XmlEvent::StartElement { name: &name, attributes: &state.attributes })?;
                emit(position, XmlEvent::EndElement(&name))?;
            }
            Ok(Event::End(_)) => {
                flush_text(&mut state, &mut emit)?;
                let name = state.open.pop().ok_or_else(|| Error::malformed("unexpected end tag", position))?;
                emit(position, XmlEvent::EndElement(&name))?;
            }
            Ok(Event::Text(e)) => {
                let text = decode_text(&e, &state.entities, position)?;
                push_text(&mut state, &text, position);
            }
            Ok(Event::CData(e)) => {
                let text = decode_cdata(e, position)?;
                push_text(&mut state, &text, position);
            }
            Ok(Event::GeneralRef(e)) => {
                let name = utf8(e.as_ref(), position)?;
                let resolved = resolve_reference(name, &state.entities, position)?.into_owned();
                push_text(&mut state, &resolved, position);
            }
            Ok(Event::Comment(e)) => {
                flush_text(&mut state, &mut emit)?;
                let text = utf8(&e, position)?;
                emit(position, XmlEvent::Comment(text))?;
            }
            Ok(Event::PI(e)) => {
                flush_text(&mut state, &mut emit)?;
                let target = utf8(e.target(), position)?;
                // quick-xml liefert den Separator-Whitespace mit.
                let data = utf8(e.content(), position)?.trim_start();
                emit(position, XmlEvent::ProcessingInstruction { target, data })?;
            }
            Ok(Event::DocType(e)) => {
                let doctype = utf8(&e, position)?;
                declare_entities(&mut state.entities, doctype, position)?;
            }
            Ok(Event::Decl(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => return Err(parser_error(e, reader.error_position())),
        }

        buf.clear();
    }

    flush_text(&mut state, &mut emit)?;
    emit(reader.buffer_position(), XmlEvent::EndDocument)
}

/// Resolves the element name and collects its attributes into `state.attributes`.
fn start_element<R: BufRead>(
    reader: &NsReader<R>,
    e: &BytesStart<'_>,
    position: u64,
    max_depth: Option<usize>,
    state: &mut DocumentState,
) -> Result<QName> {
    if let Some(limit) = max_depth
        && state.open.len() >= limit
    {
        return Err(Error::DepthLimitExceeded { limit, position });
    }

    let (ns, local) = reader.resolver().resolve_element(e.name());
    let uri = resolve_to_uri(ns, position)?;
    let local_name = utf8(local.as_ref(), position)?;
    let name = pool_qname(&mut state.qname_pool, uri, local_name);

    state.attributes.clear();
    for attr in e.attributes() {
        let attr = attr.map_err(|er| parser_error(er.into(), position))?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let (ns, local) = reader.resolver().resolve_attribute(attr.key);
        let uri = resolve_to_uri(ns, position)?;
        let local_name = utf8(local.as_ref(), position)?;
        let attr_name = pool_qname(&mut state.qname_pool, uri, local_name);

        let raw = utf8(attr.value.as_ref(), position)?;
        let value = expand_references(raw, &state.entities, position)?;
        let value = normalize_line_endings(&value).into_owned();
        if state.attributes.insert(attr_name, value).is_some() {
            // Gleicher expandierter Name ueber verschiedene Prefixe.
            return Err(Error::malformed(
                format!("duplicate attribute '{{{uri}}}{local_name}'"),
                position,
            ));
        }
    }

    Ok(name)
}

fn push_text(state: &mut DocumentState, text: &str, position: u64) {
    if state.text.is_empty() {
        state.text_start = position;
    }
    state.text.push_str(text);
}

/// Emits the pending text run. Character data outside the document element
/// must be whitespace.
fn flush_text(
    state: &mut DocumentState,
    emit: &mut impl FnMut(u64, XmlEvent<'_>) -> Result<()>,
) -> Result<()> {
    if state.text.is_empty() {
        return Ok(());
    }
    let position = state.text_start;
    if state.open.is_empty() {
        if !state.text.trim().is_empty() {
            return Err(Error::malformed("character data outside root element", position));
        }
        state.text.clear();
        return Ok(());
    }
    let result = emit(position, XmlEvent::Characters(&state.text));
    state.text.clear();
    result
}

/// Records the internal general entities of a `<!DOCTYPE>`. The first
/// declaration of a name wins; values are expanded once, here.
fn declare_entities(
    entities: &mut FastHashMap<String, String>,
    doctype: &str,
    position: u64,
) -> Result<()> {
    for (name, raw) in entity_declarations(doctype) {
        if entities.contains_key(name) {
            continue;
        }
        let value = expand_references(raw, entities, position)?.into_owned();
        if value.len() > MAX_ENTITY_EXPANSION {
            return Err(Error::malformed(
                format!("entity '{name}' expands beyond {MAX_ENTITY_EXPANSION} bytes"),
                position,
            ));
        }
        entities.insert(name.to_string(), value);
    }
    Ok(())
}

/// Replaces character, predefined and declared entity references in `raw`.
fn expand_references<'a>(
    raw: &'a str,
    entities: &FastHashMap<String, String>,
    position: u64,
) -> Result<Cow<'a, str>> {
    let bytes = raw.as_bytes();
    let Some(mut amp) = memchr(b'&', bytes) else {
        return Ok(Cow::Borrowed(raw));
    };

    let mut out = String::with_capacity(raw.len());
    let mut pos = 0;
    loop {
        out.push_str(&raw[pos..amp]);
        let Some(rel_semi) = memchr(b';', &bytes[amp + 1..]) else {
            return Err(Error::malformed("unterminated reference", position));
        };
        let semi = amp + 1 + rel_semi;
        out.push_str(&resolve_reference(&raw[amp + 1..semi], entities, position)?);
        pos = semi + 1;
        match memchr(b'&', &bytes[pos..]) {
            Some(next) => amp = pos + next,
            None => {
                out.push_str(&raw[pos..]);
                return Ok(Cow::Owned(out));
            }
        }
    }
}

/// `name` ist der Teil zwischen `&` und `;`.
fn resolve_reference<'e>(
    name: &str,
    entities: &'e FastHashMap<String, String>,
    position: u64,
) -> Result<Cow<'e, str>> {
    if let Some(code) = name.strip_prefix('#') {
        let ch = resolve_char_reference(code).ok_or_else(|| {
            Error::malformed(format!("invalid character reference '&{name};'"), position)
        })?;
        Ok(Cow::Owned(ch.to_string()))
    } else if let Some(predefined) = resolve_predefined_entity(name) {
        Ok(Cow::Borrowed(predefined))
    } else if let Some(value) = entities.get(name) {
        Ok(Cow::Borrowed(value.as_str()))
    } else {
        Err(Error::malformed(format!("unknown entity '&{name};'"), position))
    }
}

/// Gibt den gecachten QName zurueck oder erzeugt+cached ihn.
/// Bei Hash-Kollision wird ein frischer QName ohne Caching erzeugt.
fn pool_qname(pool: &mut FastHashMap<u64, QName>, uri: &str, local_name: &str) -> QName {
    let identity = compute_identity(uri, local_name);
    let qname = pool
        .entry(identity)
        .or_insert_with(|| QName::new(uri, local_name));
    if qname.matches(uri, local_name) {
        qname.clone()
    } else {
        QName::new(uri, local_name)
    }
}

fn resolve_to_uri<'a>(ns: ResolveResult<'a>, position: u64) -> Result<&'a str> {
    match ns {
        ResolveResult::Bound(ns) => utf8(ns.0, position),
        ResolveResult::Unbound => Ok(""),
        ResolveResult::Unknown(prefix) => Err(Error::malformed(
            format!("unknown namespace prefix '{}'", String::from_utf8_lossy(&prefix)),
            position,
        )),
    }
}

fn parser_error(e: quick_xml::Error, position: u64) -> Error {
    match e {
        quick_xml::Error::Io(io) => Error::Io(io),
        source => Error::Xml { source, position },
    }
}

fn utf8(bytes: &[u8], position: u64) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| Error::malformed(format!("invalid UTF-8: {e}"), position))
}

fn decode_text(
    e: &BytesText<'_>,
    entities: &FastHashMap<String, String>,
    position: u64,
) -> Result<String> {
    let raw = utf8(e, position)?;
    let text = expand_references(raw, entities, position)?;
    Ok(normalize_line_endings(&text).into_owned())
}

fn decode_cdata(e: BytesCData<'_>, position: u64) -> Result<String> {
    let bytes = e.into_inner();
    let text = utf8(&bytes, position)?;
    Ok(normalize_line_endings(text).into_owned())
}

/// XML 1.0 Sec. 2.11: \r\n -> \n, alleinstehende \r -> \n
fn normalize_line_endings(s: &str) -> Cow<'_, str> {
    if memchr(b'\r', s.as_bytes()).is_none() {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            if matches!(chars.peek(), Some('\n')) {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}

/// `code` ist der Teil nach `#`: dezimal oder `x` + hex, nur Ziffern.
/// Das Ergebnis muss ein XML-`Char` sein (XML 1.0 Sec. 2.2).
fn resolve_char_reference(code: &str) -> Option<char> {
    let code_point = match code.strip_prefix('x') {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        None if !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()) => {
            code.parse::<u32>().ok()?
        }
        _ => return None,
    };
    char::from_u32(code_point).filter(|&ch| is_xml_char(ch))
}

fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{9}' | '\u{A}' | '\u{D}' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}
