#![no_main]
use libfuzzer_sys::fuzz_target;
use svg2raphael::XmlParser;

fuzz_target!(|data: &[u8]| {
    let _ = XmlParser::new(data).parse();
});
