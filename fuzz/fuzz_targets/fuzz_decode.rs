#![no_main]

use libfuzzer_sys::fuzz_target;

use jsonshape_core::{ProductDef, RegistryBuilder, Shape};

// Accepts arbitrary bytes, attempts to parse as JSON, feeds to decode()
// against a small fixed record type. Goal: no panics, even on malformed
// input; every failure must come back as an error report.
fuzz_target!(|data: &[u8]| {
    if let Ok(document) = serde_json::from_slice::<serde_json::Value>(data) {
        let registry = RegistryBuilder::new()
            .product(ProductDef::new(
                "Fuzzed",
                vec![
                    ProductDef::field("n", Shape::I64),
                    ProductDef::field("items", Shape::list(Shape::F64)),
                    ProductDef::field("label", Shape::optional(Shape::String)),
                ],
            ))
            .expect("fresh type name")
            .seal();
        let _ = registry.decode(&document, &Shape::named("Fuzzed"));
    }
});
