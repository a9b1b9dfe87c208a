use std::time::Instant;

use proptest::prelude::*;
use weigh_core::window::{ReadingWindow, Sample};

proptest! {
    #[test]
    fn push_beyond_capacity_evicts_exactly_the_oldest(
        capacity in 1usize..8,
        values in prop::collection::vec(-1e5f64..1e5f64, 0..40),
    ) {
        let now = Instant::now();
        let mut w = ReadingWindow::new(capacity);
        for (i, &v) in values.iter().enumerate() {
            let evicted = w.push(Sample::new(v, now));
            prop_assert!(w.len() <= capacity);
            if i >= capacity {
                prop_assert_eq!(evicted.map(|s| s.value), Some(values[i - capacity]));
            } else {
                prop_assert!(evicted.is_none());
            }
        }
        let start = values.len().saturating_sub(capacity);
        let kept: Vec<f64> = w.values().collect();
        prop_assert_eq!(kept, values[start..].to_vec());
    }
}
