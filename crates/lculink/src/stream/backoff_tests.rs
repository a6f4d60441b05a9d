// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::*;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn doubles_up_to_max() {
    let mut backoff = Backoff::new(ms(1000), ms(10_000)).with_jitter(Duration::ZERO);
    let delays: Vec<_> = (0..6).map(|_| backoff.next_delay()).collect();
    assert_eq!(delays, vec![ms(1000), ms(2000), ms(4000), ms(8000), ms(10_000), ms(10_000)]);
}

#[test]
fn reset_returns_to_base() {
    let mut backoff = Backoff::new(ms(100), ms(1000)).with_jitter(Duration::ZERO);
    backoff.next_delay();
    backoff.next_delay();
    assert_eq!(backoff.current(), ms(400));

    backoff.reset();
    assert_eq!(backoff.next_delay(), ms(100));
}

#[test]
fn base_above_max_is_capped() {
    let mut backoff = Backoff::new(ms(5000), ms(1000)).with_jitter(Duration::ZERO);
    assert_eq!(backoff.next_delay(), ms(1000));
}

proptest! {
    #[test]
    fn delay_stays_within_cap_plus_jitter(base in 1u64..5_000, max in 1u64..20_000, steps in 1usize..40) {
        let mut backoff = Backoff::new(ms(base), ms(max));
        for _ in 0..steps {
            let delay = backoff.next_delay();
            prop_assert!(delay < ms(max) + DEFAULT_JITTER);
        }
    }
}
