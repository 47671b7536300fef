#![no_main]

use libfuzzer_sys::fuzz_target;
use texmill_doc::{Document, LatexWriter, Render, RenderOptions};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(doc) = Document::from_json(json) {
        let image_count = doc.images().len();
        let mapped = doc.map_images(|image| image);
        assert_eq!(mapped.images().len(), image_count);
        let _ = LatexWriter.render(&RenderOptions::default(), &mapped);
    }
});
