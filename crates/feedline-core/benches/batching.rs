use std::sync::atomic::AtomicBool;

use feedline_core::{ByteCounter, Config, NullSink, XmlEventSource, run_pipeline};
use indicatif::ProgressBar;

/// Synthetic merchant feed with `items` products
fn synthetic_feed(items: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0"?><rss xmlns:g="http://base.google.com/ns/1.0"><channel>"#,
    );
    for i in 0..items {
        xml.push_str(&format!(
            "<item><g:id>{i}</g:id><title>Product {i}</title>\
             <description>Description of product {i} with some filler text</description>\
             <g:price>{i}.99 USD</g:price></item>"
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

#[divan::bench(args = [1_000, 100_000])]
fn extract_and_batch(bencher: divan::Bencher, items: usize) {
    let xml = synthetic_feed(items);
    let config = Config {
        threshold_bytes: 64 * 1024,
        ..Default::default()
    };
    let shutdown = AtomicBool::new(false);
    bencher.bench(|| {
        let mut source = XmlEventSource::new(xml.as_bytes());
        run_pipeline(
            &mut source,
            &config,
            NullSink,
            &ByteCounter::default(),
            &shutdown,
            &ProgressBar::hidden(),
        )
        .unwrap()
    });
}

fn main() {
    divan::main();
}
