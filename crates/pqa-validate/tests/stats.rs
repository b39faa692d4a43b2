//! Property tests for the robust statistics behind outlier detection.

use pqa_validate::stats::{median, median_absolute_deviation, modified_z};
use proptest::prelude::*;

proptest! {
    #[test]
    fn median_lies_within_range(values in prop::collection::vec(-1.0e6f64..1.0e6, 1..64)) {
        let center = median(&values).unwrap();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(center >= min && center <= max);
    }

    #[test]
    fn median_ignores_order(mut values in prop::collection::vec(-1.0e6f64..1.0e6, 1..64)) {
        let before = median(&values).unwrap();
        values.reverse();
        prop_assert_eq!(before, median(&values).unwrap());
    }

    #[test]
    fn mad_is_shift_invariant(
        values in prop::collection::vec(0.0f64..1.0e4, 1..64),
        shift in -1.0e4f64..1.0e4,
    ) {
        let mad = median_absolute_deviation(&values, median(&values).unwrap()).unwrap();
        let shifted: Vec<f64> = values.iter().map(|value| value + shift).collect();
        let shifted_mad =
            median_absolute_deviation(&shifted, median(&shifted).unwrap()).unwrap();
        prop_assert!(mad >= 0.0);
        prop_assert!((mad - shifted_mad).abs() < 1e-6);
    }

    #[test]
    fn median_value_has_zero_score(
        values in prop::collection::vec(0.0f64..1.0e4, 1..64),
        mad in 0.001f64..1.0e3,
    ) {
        let center = median(&values).unwrap();
        prop_assert_eq!(modified_z(center, center, mad), Some(0.0));
    }
}

#[test]
fn empty_input_has_no_median() {
    assert_eq!(median(&[]), None);
    assert_eq!(modified_z(10.0, 5.0, 0.0), None);
}
