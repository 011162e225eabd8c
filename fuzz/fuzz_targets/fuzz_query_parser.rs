#![no_main]

use fzm::item::Item;
use fzm::query::{CaseMode, MatchOptions, Pattern};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (bool, &str, &str)| {
    // Compile an arbitrary query and match it against an arbitrary line.
    // Offsets must always land inside the line.
    let (fuzzy, query, line) = input;
    let options = MatchOptions {
        fuzzy,
        case: CaseMode::Smart,
        ..MatchOptions::default()
    };
    let pattern = Pattern::new(&options, query);
    let _ = pattern.cache_key();

    let len = line.chars().count() as u32;
    for item in pattern.match_items(&[Item::new(0, line)]) {
        assert!(item.offsets().iter().all(|o| o.start <= o.end && o.end <= len));
    }
});
