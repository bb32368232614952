use std::time::Duration;

use scan_arbiter_core::*;

fn arbiter(mode: ScanMode, millis: u64) -> ScanArbiter<String> {
    ScanArbiter::new(ArbiterCfg::new(mode, Duration::from_millis(millis)))
}

fn t(secs: f64) -> Timestamp {
    Timestamp::from_secs_f64(secs).unwrap()
}

fn s(v: &str) -> String {
    v.to_string()
}

#[test]
fn once_emits_first_then_suppresses_until_reset() {
    let mut a = arbiter(ScanMode::Once, 2000);
    assert_eq!(a.evaluate(&s("A"), t(0.0)), Decision::Emit);
    assert!(a.is_finished());
    assert_eq!(a.evaluate(&s("B"), t(1.0)), Decision::Suppress);
    a.reset();
    assert_eq!(a.evaluate(&s("C"), t(2.0)), Decision::Emit);
}

#[test]
fn once_never_rearms_on_its_own() {
    let mut a = arbiter(ScanMode::Once, 100);
    assert_eq!(a.evaluate(&s("A"), t(0.0)), Decision::Emit);
    for i in 1..50 {
        assert_eq!(a.evaluate(&s("A"), t(i as f64 * 100.0)), Decision::Suppress);
    }
}

#[test]
fn once_per_value_gates_each_value_independently() {
    let mut a = arbiter(ScanMode::OncePerValue, 2000);
    assert_eq!(a.evaluate(&s("X"), t(0.0)), Decision::Emit);
    assert_eq!(a.evaluate(&s("X"), t(5.0)), Decision::Suppress);
    assert_eq!(a.evaluate(&s("Y"), t(6.0)), Decision::Emit);
    assert!(!a.is_finished());
}

#[test]
fn once_per_value_is_case_sensitive() {
    let mut a = arbiter(ScanMode::OncePerValue, 2000);
    assert_eq!(a.evaluate(&s("abc"), t(0.0)), Decision::Emit);
    assert_eq!(a.evaluate(&s("ABC"), t(0.0)), Decision::Emit);
    assert_eq!(a.evaluate(&s("abc "), t(0.0)), Decision::Emit);
    assert_eq!(a.state().accepted_values.len(), 3);
}

#[test]
fn once_per_value_suppress_leaves_state_alone() {
    let mut a = arbiter(ScanMode::OncePerValue, 2000);
    a.evaluate(&s("X"), t(1.0));
    let before = a.state().clone();
    assert_eq!(a.evaluate(&s("X"), t(9.0)), Decision::Suppress);
    assert_eq!(a.state(), &before);
}

#[test]
fn continuous_debounces_by_interval() {
    let mut a = arbiter(ScanMode::Continuous, 2000);
    assert_eq!(a.evaluate(&s("A"), t(0.0)), Decision::Emit);
    assert_eq!(a.evaluate(&s("A"), t(1.0)), Decision::Suppress);
    assert_eq!(a.evaluate(&s("A"), t(2.0)), Decision::Emit);
    assert_eq!(a.evaluate(&s("B"), t(3.5)), Decision::Suppress);
    assert_eq!(a.evaluate(&s("B"), t(4.0)), Decision::Emit);
}

#[test]
fn continuous_boundary_is_exact_for_decimal_times() {
    let mut a = arbiter(ScanMode::Continuous, 200);
    assert_eq!(a.evaluate(&s("A"), t(0.1)), Decision::Emit);
    assert_eq!(a.evaluate(&s("A"), Timestamp::from_nanos(299_999_999)), Decision::Suppress);
    assert_eq!(a.evaluate(&s("A"), t(0.3)), Decision::Emit);
    assert_eq!(a.evaluate(&s("A"), t(0.7)), Decision::Emit);
    assert_eq!(a.evaluate(&s("A"), t(0.9)), Decision::Emit);
}

#[test]
fn continuous_first_event_passes_sentinel_at_any_time() {
    let mut a = arbiter(ScanMode::Continuous, 2000);
    assert_eq!(a.evaluate(&s("A"), t(-1_000_000.0)), Decision::Emit);

    let mut b = arbiter(ScanMode::Continuous, 3_600_000);
    assert_eq!(b.evaluate(&s("A"), t(0.0)), Decision::Emit);
}

#[test]
fn manual_accepts_once_inside_window() {
    let mut a = arbiter(ScanMode::Manual, 500);
    a.arm_manual_capture(t(10.0));
    assert_eq!(a.evaluate(&s("Z"), t(10.4)), Decision::Emit);
    assert_eq!(a.evaluate(&s("W"), t(10.6)), Decision::Suppress);
}

#[test]
fn manual_window_is_inclusive() {
    let mut a = arbiter(ScanMode::Manual, 500);
    a.arm_manual_capture(t(10.0));
    assert_eq!(a.evaluate(&s("Z"), t(10.5)), Decision::Emit);
}

#[test]
fn manual_window_boundary_is_exact_for_decimal_times() {
    let mut a = arbiter(ScanMode::Manual, 300);
    a.arm_manual_capture(t(0.1));
    assert_eq!(a.evaluate(&s("Z"), t(0.4)), Decision::Emit);

    let mut b = arbiter(ScanMode::Manual, 300);
    b.arm_manual_capture(t(0.1));
    assert_eq!(b.evaluate(&s("Z"), Timestamp::from_nanos(400_000_001)), Decision::Suppress);
}

#[test]
fn manual_rejects_late_events() {
    let mut a = arbiter(ScanMode::Manual, 500);
    a.arm_manual_capture(t(10.0));
    assert_eq!(a.evaluate(&s("Z"), t(10.75)), Decision::Suppress);
    assert!(!a.is_finished());
}

#[test]
fn manual_without_arm_never_emits() {
    let mut a = arbiter(ScanMode::Manual, 500);
    assert_eq!(a.evaluate(&s("Z"), t(0.0)), Decision::Suppress);
    assert_eq!(a.evaluate(&s("Z"), t(1e9)), Decision::Suppress);
}

#[test]
fn manual_rearm_opens_new_window() {
    let mut a = arbiter(ScanMode::Manual, 500);
    a.arm_manual_capture(t(1.0));
    assert_eq!(a.evaluate(&s("A"), t(1.1)), Decision::Emit);
    assert_eq!(a.evaluate(&s("B"), t(1.2)), Decision::Suppress);
    a.arm_manual_capture(t(5.0));
    assert!(!a.is_finished());
    assert_eq!(a.evaluate(&s("B"), t(5.2)), Decision::Emit);
}

#[test]
fn arm_is_noop_outside_manual_mode() {
    let mut a = arbiter(ScanMode::Once, 500);
    assert_eq!(a.evaluate(&s("A"), t(0.0)), Decision::Emit);
    a.arm_manual_capture(t(1.0));
    assert!(a.is_finished());
    assert_eq!(a.state().last_emit_at, Some(t(0.0)));
}

#[test]
fn reset_restores_fresh_state() {
    let mut a = arbiter(ScanMode::OncePerValue, 2000);
    a.evaluate(&s("X"), t(1.0));
    a.evaluate(&s("Y"), t(2.0));
    a.reset();
    assert_eq!(a.state(), &ArbiterState::default());
    a.reset();
    assert_eq!(a.state(), &ArbiterState::default());
    assert_eq!(a.evaluate(&s("X"), t(3.0)), Decision::Emit);
}

#[test]
fn arbiter_is_generic_over_value_type() {
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Code {
        symbology: &'static str,
        payload: String,
    }

    let mut a: ScanArbiter<Code> =
        ScanArbiter::new(ArbiterCfg::new(ScanMode::OncePerValue, Duration::from_secs(2)));
    let qr = Code { symbology: "qr", payload: "hello".into() };
    let ean = Code { symbology: "ean13", payload: "hello".into() };
    assert_eq!(a.evaluate(&qr, t(0.0)), Decision::Emit);
    assert_eq!(a.evaluate(&ean, t(0.0)), Decision::Emit);
    assert_eq!(a.evaluate(&qr, t(1.0)), Decision::Suppress);
}

#[test]
fn pass_selects_first_valid_candidate() {
    let pass = RecognitionPass::with_candidates(vec![s("x"), s("12"), s("34")], t(4.0));
    let ev = pass
        .first_valid(|c| c.chars().all(|ch| ch.is_ascii_digit()))
        .expect("a digit candidate");
    assert_eq!(ev, RecognitionEvent::new(s("12"), t(4.0)));
}

#[test]
fn pass_preprocesses_before_validation() {
    let pass = RecognitionPass::with_candidates(vec![s(" ab "), s("cd")], t(1.0));
    let ev = pass
        .select(|c| c.trim().to_uppercase(), |c| c == "AB")
        .expect("trimmed candidate");
    assert_eq!(ev.value, "AB");
}

#[test]
fn pass_without_valid_candidate_yields_nothing() {
    let mut pass = RecognitionPass::new(Timestamp::ZERO);
    assert!(pass.is_empty());
    pass.push(s("nope"));
    assert!(pass.first_valid(|_| false).is_none());
}
