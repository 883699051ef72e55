#![no_main]
use libfuzzer_sys::fuzz_target;
use safesax::QName;

fuzz_target!(|data: &str| {
    // Clark notation must round-trip through Display.
    if let Some(name) = QName::from_clark(data) {
        let printed = name.to_string();
        assert_eq!(QName::from_clark(&printed), Some(name));
    }
});
