//! Round-trip properties of the diff/patch core.
//!
//! For arbitrary original/formatted pairs: computing the ed script and
//! replaying it onto a buffer holding the original must reproduce the
//! formatted text byte-for-byte, including missing-final-newline cases.

use patchup::core::buffer::{LineBuffer, TextBuffer};
use patchup::core::{ed_diff, patch};
use proptest::prelude::*;

/// Small line soup with an optional unterminated tail line.
fn text_strategy() -> impl Strategy<Value = String> {
    let line = prop_oneof![
        Just("alpha\n".to_string()),
        Just("beta\n".to_string()),
        Just("gamma gamma\n".to_string()),
        Just("\n".to_string()),
        Just("    indented\n".to_string()),
        Just("crlf line\r\n".to_string()),
    ];

    (
        prop::collection::vec(line, 0..12),
        prop::option::of(Just("tail".to_string())),
    )
        .prop_map(|(lines, tail)| {
            let mut text = lines.concat();
            if let Some(tail) = tail {
                text.push_str(&tail);
            }
            text
        })
}

proptest! {
    #[test]
    fn compute_then_apply_reproduces_formatted(
        original in text_strategy(),
        formatted in text_strategy(),
    ) {
        let script = ed_diff::compute(&original, &formatted);
        let mut buffer = TextBuffer::from_text(&original);
        patch::apply(&mut buffer, &script).unwrap();
        prop_assert_eq!(buffer.text(), formatted);
    }

    #[test]
    fn identical_inputs_yield_empty_scripts(text in text_strategy()) {
        prop_assert!(ed_diff::compute(&text, &text).is_empty());
    }

    #[test]
    fn render_parse_round_trip(
        original in text_strategy(),
        formatted in text_strategy(),
    ) {
        let script = ed_diff::compute(&original, &formatted);
        let parsed = ed_diff::parse(&ed_diff::render(&script)).unwrap();
        prop_assert_eq!(parsed, script);
    }
}
