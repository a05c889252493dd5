use proptest::prelude::*;

use cliptrigger::exec::{LineSplitter, split_all};

/// Output made of short printable chunks separated by runs of `\r` / `\n`.
fn output_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(
        prop_oneof![
            "[a-zA-Z0-9 %\\[\\]]{1,12}".prop_map(String::into_bytes),
            proptest::collection::vec(prop_oneof![Just(b'\r'), Just(b'\n')], 1..4),
        ],
        0..30,
    )
    .prop_map(|parts| parts.concat())
}

/// Reference model: every maximal run of non-terminator bytes is one line.
fn expected_lines(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|b| *b == b'\r' || *b == b'\n')
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect()
}

proptest! {
    #[test]
    fn lines_never_contain_terminators_and_are_never_empty(bytes in output_strategy()) {
        for line in split_all(&bytes) {
            prop_assert!(!line.is_empty());
            prop_assert!(!line.contains('\r'));
            prop_assert!(!line.contains('\n'));
        }
    }

    #[test]
    fn splitting_matches_the_reference_model(bytes in output_strategy()) {
        prop_assert_eq!(split_all(&bytes), expected_lines(&bytes));
    }

    #[test]
    fn chunking_does_not_change_the_result(
        bytes in output_strategy(),
        cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let mut points: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
        points.sort_unstable();

        let mut splitter = LineSplitter::new();
        let mut lines = Vec::new();
        let mut start = 0;
        for point in points.into_iter().chain(std::iter::once(bytes.len())) {
            splitter.feed(&bytes[start..point], |l| lines.push(l));
            start = point;
        }
        lines.extend(splitter.finish());

        prop_assert_eq!(lines, split_all(&bytes));
    }

    #[test]
    fn text_content_is_preserved(bytes in output_strategy()) {
        let joined: String = split_all(&bytes).concat();
        let stripped: String = String::from_utf8_lossy(&bytes)
            .chars()
            .filter(|c| *c != '\r' && *c != '\n')
            .collect();
        prop_assert_eq!(joined, stripped);
    }
}
