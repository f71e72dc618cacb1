use line_search::search::{Algorithm, MatchResult};
use line_search::source::LineSet;
use proptest::prelude::*;

proptest! {
    #[test]
    fn exact_strategies_agree_with_linear(
        lines in prop::collection::vec(any_line(), 0..200),
        query in any_query(),
        chunk_size in 1usize..64,
    ) {
        let set = LineSet::parse(&lines.join("\n"));
        let expected = Algorithm::Linear.matcher(chunk_size).find(&set, &query).unwrap();

        for algorithm in [Algorithm::Buffered, Algorithm::Preloaded, Algorithm::Hash] {
            let got = algorithm.matcher(chunk_size).find(&set, &query).unwrap();
            prop_assert_eq!(got, expected, "{:?}", algorithm);
        }
    }

    #[test]
    fn binary_agrees_with_linear_on_sorted_input(
        lines in prop::collection::vec(any_line(), 0..200),
        query in any_query(),
    ) {
        let set = LineSet::parse_sorted(&lines.join("\n"));
        let linear = Algorithm::Linear.matcher(1).find(&set, &query).unwrap();
        let binary = Algorithm::Binary.matcher(1).find(&set, &query).unwrap();
        prop_assert_eq!(binary, linear);
    }

    #[test]
    fn binary_never_contradicts_linear_on_padded_lines(
        lines in prop::collection::vec(any_line(), 0..200),
        query in any_query(),
    ) {
        let set = LineSet::from_lines(lines);
        let linear = Algorithm::Linear.matcher(1).find(&set, &query).unwrap();
        match Algorithm::Binary.matcher(1).find(&set, &query) {
            Ok(binary) => prop_assert_eq!(binary, linear),
            Err(_) => prop_assert!(!set.is_sorted()),
        }
    }

    #[test]
    fn anchored_literal_pattern_matches_like_exact_search(
        lines in prop::collection::vec(any_line(), 0..100),
        query in any_query(),
    ) {
        let set = LineSet::parse(&lines.join("\n"));
        let pattern = format!("^{}$", regex::escape(&query));
        let by_regex = Algorithm::Regex.matcher(1).find(&set, &pattern).unwrap();
        let exact = Algorithm::Linear.matcher(1).find(&set, &query).unwrap();
        prop_assert_eq!(by_regex, exact);
    }

    #[test]
    fn every_line_is_found(lines in prop::collection::vec(any_line(), 1..100)) {
        let set = LineSet::parse(&lines.join("\n"));
        for line in set.lines().iter().filter(|l| !l.is_empty()) {
            for algorithm in Algorithm::ALL {
                let query = if algorithm.is_exact() {
                    line.clone()
                } else {
                    format!("^{}$", regex::escape(line))
                };
                let sorted_ok = algorithm != Algorithm::Binary || set.is_sorted();
                if sorted_ok {
                    prop_assert_eq!(
                        algorithm.matcher(8).find(&set, &query).unwrap(),
                        MatchResult::Exists,
                        "{:?} {:?}", algorithm, line
                    );
                }
            }
        }
    }
}

/// Short lines over a tiny alphabet so queries often hit; padding exercises trimming.
fn any_line() -> impl Strategy<Value = String> {
    ("[ \t]{0,2}", "[abc]{0,4}", "[ \t]{0,2}")
        .prop_map(|(lead, body, tail)| format!("{lead}{body}{tail}"))
}

fn any_query() -> impl Strategy<Value = String> {
    "[abc]{1,4}"
}
