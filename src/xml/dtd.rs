//! Internal DTD subset: general entity declarations.

/// Extrahiert `<!ENTITY name "value">` Deklarationen aus dem Inhalt einer
/// `<!DOCTYPE ...>` Deklaration, in Dokumentreihenfolge. Werte bleiben roh.
///
/// Parameter entities (`<!ENTITY % ...>`) and external entities
/// (`SYSTEM`/`PUBLIC`) are skipped.
pub(crate) fn entity_declarations(doctype: &str) -> Vec<(&str, &str)> {
    let mut declarations = Vec::new();
    let Some(open) = doctype.find('[') else {
        return declarations;
    };
    let subset = &doctype[open + 1..];
    let mut rest = subset.rfind(']').map_or(subset, |close| &subset[..close]);

    while let Some(offset) = rest.find("<!ENTITY") {
        rest = rest[offset + "<!ENTITY".len()..].trim_start();
        if rest.starts_with('%') {
            rest = skip_declaration(rest);
            continue;
        }
        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let Some(quote) = rest.chars().next().filter(|c| matches!(*c, '"' | '\'')) else {
            // SYSTEM / PUBLIC
            rest = skip_declaration(rest);
            continue;
        };
        let value = &rest[1..];
        let Some(value_end) = value.find(quote) else {
            break;
        };
        if !name.is_empty() {
            declarations.push((name, &value[..value_end]));
        }
        rest = skip_declaration(&value[value_end + 1..]);
    }

    declarations
}

fn skip_declaration(rest: &str) -> &str {
    rest.find('>').map_or("", |gt| &rest[gt + 1..])
}
