use proptest::prelude::*;

use cliptrigger::watch::ChangeFilter;

proptest! {
    #[test]
    fn forwarded_texts_are_non_empty_and_never_repeat_back_to_back(
        texts in proptest::collection::vec(prop_oneof!["", "a", "b", "[a-c]{0,3}"], 0..40),
    ) {
        let mut filter = ChangeFilter::new();
        let forwarded: Vec<String> = texts
            .into_iter()
            .filter_map(|t| filter.observe(t))
            .collect();

        for text in &forwarded {
            prop_assert!(!text.is_empty());
        }
        for pair in forwarded.windows(2) {
            prop_assert_ne!(&pair[0], &pair[1]);
        }
    }
}
