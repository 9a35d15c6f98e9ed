use proptest::prelude::*;

use statcast_engine::metrics::{hard_hit, spray_angle};
use statcast_engine::{
    BattedBallEvent, CompareOp, EngineConfig, Hand, Handedness, Metric, Predicate, SubsetEngine,
};

fn opt(range: std::ops::Range<f64>) -> impl Strategy<Value = Option<f64>> {
    prop_oneof![1 => Just(None), 4 => range.prop_map(Some)]
}

fn handedness() -> impl Strategy<Value = Handedness> {
    prop_oneof![
        Just(Handedness::Left),
        Just(Handedness::Right),
        Just(Handedness::Switch),
    ]
}

fn hand() -> impl Strategy<Value = Hand> {
    prop_oneof![Just(Hand::Left), Just(Hand::Right)]
}

fn event() -> impl Strategy<Value = BattedBallEvent> {
    (
        opt(-10.0..125.0),
        opt(-90.0..90.0),
        opt(-150.0..150.0),
        opt(-20.0..250.0),
        prop::option::of(handedness()),
        prop::option::of(hand()),
    )
        .prop_map(|(ev, la, x, y, batter_handedness, pitcher_throws)| BattedBallEvent {
            exit_velocity: ev,
            launch_angle: la,
            hit_coordinate_x: x,
            hit_coordinate_y: y,
            batter_handedness,
            pitcher_throws,
            ..Default::default()
        })
}

fn metric() -> impl Strategy<Value = Metric> {
    prop::sample::select(Metric::ALL.to_vec())
}

fn op() -> impl Strategy<Value = CompareOp> {
    prop::sample::select(vec![
        CompareOp::Lt,
        CompareOp::Le,
        CompareOp::Eq,
        CompareOp::Ge,
        CompareOp::Gt,
    ])
}

fn predicate() -> impl Strategy<Value = Predicate> {
    let leaf = (metric(), op(), -50.0..120.0f64)
        .prop_map(|(m, o, v)| Predicate::compare(m, o, v))
        .boxed();
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(p, q)| p.and(q)),
            (inner.clone(), inner.clone()).prop_map(|(p, q)| p.or(q)),
            inner.prop_map(Predicate::negate),
        ]
    })
}

proptest! {
    #[test]
    fn hard_hit_iff_threshold(ev in opt(-10.0..125.0), threshold in 60.0..110.0f64) {
        let event = BattedBallEvent::new(ev, None, None, None, Handedness::Right);
        match ev {
            Some(v) => prop_assert_eq!(hard_hit(&event, threshold), Some(v >= threshold)),
            None => prop_assert_eq!(hard_hit(&event, threshold), None),
        }
    }

    #[test]
    fn pulled_is_positive_for_either_side(x in 0.1..150.0f64, y in 0.1..250.0f64) {
        // Pull side is negative x for a right-handed batter, positive for a left.
        let rhb = BattedBallEvent::new(None, None, Some(-x), Some(y), Handedness::Right);
        let lhb = BattedBallEvent::new(None, None, Some(x), Some(y), Handedness::Left);
        prop_assert!(spray_angle(&rhb).unwrap() > 0.0);
        prop_assert!(spray_angle(&lhb).unwrap() > 0.0);
        prop_assert!((spray_angle(&rhb).unwrap() - spray_angle(&lhb).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn switch_hitter_pull_is_positive_once_side_is_known(
        x in 0.1..150.0f64,
        y in 0.1..250.0f64,
        pitcher in hand(),
    ) {
        // Against a right-handed pitcher the switch hitter bats left and pulls to +x.
        let pull_x = match pitcher {
            Hand::Right => x,
            Hand::Left => -x,
        };
        let pulled = BattedBallEvent::new(None, None, Some(pull_x), Some(y), Handedness::Switch)
            .with_pitcher_throws(pitcher);
        let oppo = BattedBallEvent::new(None, None, Some(-pull_x), Some(y), Handedness::Switch)
            .with_pitcher_throws(pitcher);
        prop_assert!(spray_angle(&pulled).unwrap() > 0.0);
        prop_assert!(spray_angle(&oppo).unwrap() < 0.0);

        let unresolved = BattedBallEvent::new(None, None, Some(pull_x), Some(y), Handedness::Switch);
        prop_assert_eq!(spray_angle(&unresolved), None);
    }

    #[test]
    fn zero_vertical_coordinate_is_zero(
        x in -150.0..150.0f64,
        batter in prop::option::of(handedness()),
        pitcher in prop::option::of(hand()),
    ) {
        let event = BattedBallEvent {
            hit_coordinate_x: Some(x),
            hit_coordinate_y: Some(0.0),
            batter_handedness: batter,
            pitcher_throws: pitcher,
            ..Default::default()
        };
        prop_assert_eq!(spray_angle(&event), Some(0.0));
    }

    #[test]
    fn chained_filter_equals_conjunction(
        records in prop::collection::vec(event(), 0..40),
        p in predicate(),
        q in predicate(),
    ) {
        let engine = SubsetEngine::new(EngineConfig::default()).unwrap();
        let chained = engine.filter(&engine.filter(&records, &p), &q);
        let conj = engine.filter(&records, &p.clone().and(q.clone()));
        prop_assert_eq!(chained.len(), conj.len());
        for (a, b) in chained.iter().zip(conj.iter()) {
            prop_assert!(std::ptr::eq(a, b));
        }
    }

    #[test]
    fn filter_keeps_only_true_and_counts_the_rest(
        records in prop::collection::vec(event(), 0..40),
        p in predicate(),
    ) {
        let engine = SubsetEngine::new(EngineConfig::default()).unwrap();
        let subset = engine.filter(&records, &p);
        prop_assert!(subset.iter().all(|ev| engine.evaluate(&p, ev).is_true()));
        prop_assert_eq!(subset.determined() + subset.undetermined(), records.len());
        prop_assert!(subset.len() <= subset.determined());
    }

    #[test]
    fn derivation_is_deterministic(ev in event(), m in metric(), p in predicate()) {
        let engine = SubsetEngine::new(EngineConfig::default()).unwrap();
        let first = engine.derive(m, &ev);
        let second = engine.derive(m, &ev);
        prop_assert_eq!(first.map(f64::to_bits), second.map(f64::to_bits));
        prop_assert_eq!(engine.evaluate(&p, &ev), engine.evaluate(&p, &ev));
    }

    #[test]
    fn summary_count_matches_present_values(
        records in prop::collection::vec(event(), 0..40),
        m in metric(),
    ) {
        let engine = SubsetEngine::new(EngineConfig::default()).unwrap();
        let all = statcast_engine::Subset::all(&records);
        let present = records.iter().filter(|ev| engine.derive(m, ev).is_some()).count();
        let summary = engine.summarize(&all, m);
        match summary.stats() {
            Some(s) => {
                prop_assert_eq!(s.count, present);
                prop_assert!(s.min <= s.median && s.median <= s.p90 && s.p90 <= s.max);
                prop_assert!(s.min - 1e-9 <= s.mean && s.mean <= s.max + 1e-9);
            }
            None => prop_assert_eq!(present, 0),
        }
    }
}
