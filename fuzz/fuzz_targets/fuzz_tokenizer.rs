#![no_main]

use arbitrary::Arbitrary;
use fzm::utils::{Delimiter, split_nth, tokenize, transform};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    line: &'a str,
    delimiter: Option<&'a str>,
    nth: &'a str,
}

fuzz_target!(|input: Input| {
    // Tokens must cover valid char ranges for any delimiter and range list
    let chars: Vec<char> = input.line.chars().collect();
    let delimiter = input.delimiter.map(Delimiter::parse).unwrap_or_default();
    let tokens = tokenize(input.line, &chars, &delimiter);
    for token in &tokens {
        assert!(token.span.end <= chars.len());
    }

    if let Ok(nth) = split_nth(input.nth) {
        for token in transform(&chars, &tokens, &nth) {
            assert!(token.span.start <= token.span.end && token.span.end <= chars.len());
        }
    }
});
