//! Property-based tests for the filter engine and the rate loop.

use model_matching::io::RateSample;
use model_matching::{ControlConfig, ControllerBank, DigitalFilter, RateLoop, ResetPolicy};
use nalgebra::Vector2;
use proptest::prelude::*;

const ROLL_C2_NUM: [f64; 4] = [
    0.012510069026241,
    -0.024547894599545,
    0.012041446603292,
    0.0,
];
const ROLL_C2_DEN: [f64; 4] = [
    1.000000000000000,
    -2.946258464464385,
    2.896013098191188,
    -0.949744366519786,
];

fn rate_loop() -> RateLoop {
    let config = ControlConfig::default();
    let (_, bank) = ControllerBank::build(&config).unwrap().into_parts();
    RateLoop::new(bank, ResetPolicy::default())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// No input sequence may push the output past the configured limit.
    #[test]
    fn prop_output_never_exceeds_limit(
        inputs in prop::collection::vec(-1.0e6f64..1.0e6, 1..200),
        limit in 0.0f64..500.0,
    ) {
        let mut filter =
            DigitalFilter::<f64>::initialize(&ROLL_C2_NUM, &ROLL_C2_DEN, limit, 100.0).unwrap();
        for x in inputs {
            let y = filter.update(x);
            prop_assert!(y.abs() <= limit, "output {y} beyond limit {limit}");
        }
    }

    /// A step large enough to saturate lands exactly on the limit.
    #[test]
    fn prop_saturation_is_exact(
        gain in 0.1f64..10.0,
        limit in 0.1f64..100.0,
        sign in prop::bool::ANY,
    ) {
        let mut filter = DigitalFilter::<f64>::initialize(&[gain], &[1.0], limit, 100.0).unwrap();
        let step = if sign { 1.0 } else { -1.0 } * (limit / gain) * 2.0;
        let y = filter.update(step);
        prop_assert_eq!(y, if sign { limit } else { -limit });
    }

    /// Reset twice equals reset once: the filter replays the same response.
    #[test]
    fn prop_reset_is_idempotent(
        warmup in prop::collection::vec(-100.0f64..100.0, 0..50),
        replay in prop::collection::vec(-100.0f64..100.0, 1..20),
    ) {
        let mut once =
            DigitalFilter::<f64>::initialize(&ROLL_C2_NUM, &ROLL_C2_DEN, 1.0e4, 100.0).unwrap();
        for x in &warmup {
            once.update(*x);
        }
        let mut twice = once.clone();
        once.reset();
        twice.reset();
        twice.reset();

        prop_assert!(once.is_at_rest());
        for x in replay {
            prop_assert_eq!(once.update(x), twice.update(x));
        }
    }

    /// The rate loop adds nothing beyond feedback and feedforward.
    #[test]
    fn prop_total_is_sum(
        ticks in prop::collection::vec(
            (-45.0f64..45.0, -500.0f64..500.0, -500.0f64..500.0, prop::bool::weighted(0.1)),
            1..100,
        ),
    ) {
        let mut inner = rate_loop();
        for (k, (reference, rate, setpoint, stopped)) in ticks.into_iter().enumerate() {
            let sample = RateSample {
                reference: Vector2::new(reference, -reference),
                rate: Vector2::new(rate, -rate),
                acceleration: Vector2::zeros(),
                motors_stopped: stopped,
                now_us: k as u32 * 1_000,
            };
            let out = inner.step(&sample, Vector2::new(setpoint, -setpoint));
            prop_assert_eq!(out.total, out.feedback + out.feedforward);
        }
    }
}
