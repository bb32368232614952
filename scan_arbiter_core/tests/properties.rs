//! Property tests over random event streams for each scan mode.

use std::collections::HashMap;
use std::time::Duration;

use proptest::prelude::*;
use scan_arbiter_core::*;

/// Random stream of (value, gap) pairs turned into non-decreasing timestamps.
/// Millisecond granularity so interval boundaries are hit exactly.
fn stream() -> impl Strategy<Value = Vec<(String, Timestamp)>> {
    prop::collection::vec(("[a-d]", 0i64..3_000), 1..60).prop_map(|items| {
        let mut t = 0;
        items
            .into_iter()
            .map(|(v, gap)| {
                t += gap;
                (v, Timestamp::from_millis(t))
            })
            .collect()
    })
}

fn run(mode: ScanMode, interval: Duration, events: &[(String, Timestamp)]) -> Vec<(String, Timestamp)> {
    let mut a = ScanArbiter::new(ArbiterCfg::new(mode, interval));
    events
        .iter()
        .filter(|(v, t)| a.evaluate(v, *t).is_emit())
        .cloned()
        .collect()
}

proptest! {
    #[test]
    fn once_emits_at_most_once(events in stream()) {
        let emitted = run(ScanMode::Once, Duration::from_secs(2), &events);
        prop_assert_eq!(emitted.len(), 1);
        prop_assert_eq!(&emitted[0], &events[0]);
    }

    #[test]
    fn once_per_value_emits_each_value_once(events in stream()) {
        let emitted = run(ScanMode::OncePerValue, Duration::from_secs(2), &events);
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for (v, _) in &emitted {
            *counts.entry(v.as_str()).or_default() += 1;
        }
        prop_assert!(counts.values().all(|&c| c == 1));
        let mut distinct: Vec<&str> = events.iter().map(|(v, _)| v.as_str()).collect();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(counts.len(), distinct.len());
    }

    #[test]
    fn continuous_emissions_respect_interval(events in stream(), interval_ms in 100u64..5_000) {
        let interval = Duration::from_millis(interval_ms);
        let emitted = run(ScanMode::Continuous, interval, &events);
        prop_assert_eq!(&emitted[0], &events[0]);
        let min = interval.as_nanos() as i128;
        for pair in emitted.windows(2) {
            prop_assert!(pair[1].1.nanos_since(pair[0].1) >= min);
        }
        // Every suppressed event really was too close to the previous emit.
        let mut last = None;
        for (v, t) in &events {
            let due = last.map_or(true, |l: Timestamp| t.nanos_since(l) >= min);
            if due {
                prop_assert!(emitted.contains(&(v.clone(), *t)));
                last = Some(*t);
            }
        }
    }

    #[test]
    fn manual_emits_once_per_arm_inside_window(
        events in stream(),
        arm_ms in 0i64..20_000,
        window_ms in 100u64..1_000,
    ) {
        let window = Duration::from_millis(window_ms);
        let arm_at = Timestamp::from_millis(arm_ms);
        let mut a = ScanArbiter::new(ArbiterCfg::new(ScanMode::Manual, window));

        for (v, t) in events.iter().filter(|(_, t)| *t < arm_at) {
            prop_assert_eq!(a.evaluate(v, *t), Decision::Suppress);
        }

        a.arm_manual_capture(arm_at);
        let after: Vec<_> = events.iter().filter(|(_, t)| *t >= arm_at).collect();
        let first_in_window = after
            .first()
            .filter(|(_, t)| t.nanos_since(arm_at) <= window.as_nanos() as i128)
            .map(|(_, t)| *t);

        let mut emitted = Vec::new();
        for (v, t) in &after {
            if a.evaluate(v, *t).is_emit() {
                emitted.push(*t);
            }
        }
        match first_in_window {
            Some(t) => prop_assert_eq!(emitted, vec![t]),
            None => prop_assert!(emitted.is_empty()),
        }
    }

    #[test]
    fn reset_matches_fresh_arbiter(
        events in stream(),
        mode in prop_oneof![
            Just(ScanMode::Once),
            Just(ScanMode::OncePerValue),
            Just(ScanMode::Continuous),
            Just(ScanMode::Manual),
        ],
    ) {
        let cfg = ArbiterCfg::new(mode, Duration::from_secs(2));
        let mut used = ScanArbiter::new(cfg.clone());
        for (v, t) in &events {
            used.evaluate(v, *t);
        }
        used.reset();

        let mut fresh = ScanArbiter::new(cfg);
        let (v, t) = events.last().cloned().unwrap_or_default();
        let later = t.saturating_add(Duration::from_secs(1));
        prop_assert_eq!(used.evaluate(&v, later), fresh.evaluate(&v, later));
        prop_assert_eq!(used.state(), fresh.state());
    }
}
