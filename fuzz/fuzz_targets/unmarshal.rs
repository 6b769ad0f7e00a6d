#![no_main]

use std::collections::BTreeMap;

use libfuzzer_sys::fuzz_target;

use urlquery::{DecodeLimits, Parser, ParserOptions, QueryDecode};

#[derive(Debug, Default, Clone, QueryDecode)]
struct Leaf {
    name: String,
    #[query = "n,required"]
    n: i64,
    flag: Option<bool>,
}

#[derive(Debug, Default, QueryDecode)]
struct Target {
    leaf: Leaf,
    leaves: Vec<Leaf>,
    grid: [u8; 4],
    map: BTreeMap<String, f64>,
    next: Option<Box<Target>>,
}

fuzz_target!(|data: &[u8]| {
    let limits = DecodeLimits {
        max_auto_index: 1 << 10,
        max_slice_len: 1 << 10,
        max_depth: 64,
    };
    let parser = Parser::with_options(ParserOptions::default().with_limits(limits));
    let mut target = Target::default();
    let _ = parser.unmarshal(data, &mut target);
});
