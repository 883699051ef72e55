#![no_main]
use libfuzzer_sys::fuzz_target;
use safesax::listener::{element_fns, end_text};
use safesax::{ParseOptions, RootElement};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes against a small Atom-like schema; errors are fine, panics are not.
    let mut root = RootElement::new("http://www.w3.org/2005/Atom", "feed");
    let _ = root.set_element_listener(element_fns(|_| Ok(()), || Ok(())));
    if let Ok(entry) = root.require_child("entry") {
        let _ = entry.set_element_listener(element_fns(|_| Ok(()), || Ok(())));
        if let Ok(id) = entry.require_child("id") {
            let _ = id.set_text_element_listener(end_text(|body: &str| {
                if body.contains('\0') {
                    return Err(safesax::Error::listener("nul in body"));
                }
                Ok(())
            }));
        }
        let _ = entry.get_child_ns("", "title");
    }

    let _ = root.parse(data);
    let _ = root.parse_with_options(data, &ParseOptions::default().with_max_depth(8).with_trim_text(true));
});
