use proptest::prelude::*;
use tally_core::Aggregate;

proptest! {
    #[test]
    fn prop_count_matches_input_len(ratings in prop::collection::vec(0.0f64..=5.0, 0..64)) {
        let agg = Aggregate::from_ratings(ratings.iter().copied());
        prop_assert_eq!(agg.count, ratings.len() as u64);
    }

    #[test]
    fn prop_mean_stays_within_rating_domain(ratings in prop::collection::vec(0.0f64..=5.0, 1..64)) {
        let agg = Aggregate::from_ratings(ratings.iter().copied());
        let min = ratings.iter().copied().fold(f64::INFINITY, f64::min);
        let max = ratings.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(agg.score >= min - 1e-9 && agg.score <= max + 1e-9);
    }

    #[test]
    fn prop_recomputing_is_deterministic(ratings in prop::collection::vec(0.0f64..=5.0, 0..64)) {
        let first = Aggregate::from_ratings(ratings.iter().copied());
        let second = Aggregate::from_ratings(ratings.iter().copied());
        prop_assert_eq!(first, second);
    }
}
