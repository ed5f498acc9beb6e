use simple_pi::source::{seeded, Replay};
use simple_pi::timing::timed;
use simple_pi::{count_hits, estimate_pi, PiError};

fn std_dev(values: &[f64]) -> f64 {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

#[test]
fn four_scripted_points_give_two() {
    let mut src =
        Replay::from_points(&[(0.1, 0.1), (0.9, 0.9), (0.2, 0.3), (0.99, 0.99)]).unwrap();
    assert_eq!(count_hits(4, &mut src.clone()), 2);
    assert_eq!(estimate_pi(4, &mut src).unwrap(), 2.0);
}

#[test]
fn zero_trials_fail_without_nan() {
    let mut rng = seeded(3);
    let err = estimate_pi(0, &mut rng).unwrap_err();
    assert!(matches!(err, PiError::InvalidArgument(_)));
}

#[test]
fn estimates_stay_in_range() {
    let mut rng = seeded(17);
    for n in [1, 2, 3, 10, 100, 1000] {
        for _ in 0..20 {
            let pi = estimate_pi(n, &mut rng).unwrap();
            assert!((0.0..=4.0).contains(&pi), "n={} gave {}", n, pi);
        }
    }
}

#[test]
fn same_seed_is_bit_identical() {
    let a = estimate_pi(200_000, &mut seeded(123)).unwrap();
    let b = estimate_pi(200_000, &mut seeded(123)).unwrap();
    assert_eq!(a.to_bits(), b.to_bits());
}

#[test]
fn dynamic_source_handle() {
    let mut rng = seeded(8);
    let source: &mut dyn simple_pi::UnitSource = &mut rng;
    let pi = estimate_pi(10_000, source).unwrap();
    assert!((pi - std::f64::consts::PI).abs() < 0.2);
}

#[test]
fn spread_shrinks_like_inverse_sqrt_n() {
    let mut rng = seeded(2021);
    let runs = 20;
    let small: Vec<f64> = (0..runs).map(|_| estimate_pi(1_000, &mut rng).unwrap()).collect();
    let large: Vec<f64> = (0..runs).map(|_| estimate_pi(100_000, &mut rng).unwrap()).collect();

    // 100x the trials should cut the spread by about 10x
    let ratio = std_dev(&small) / std_dev(&large);
    assert!(ratio > 4.0 && ratio < 25.0, "spread ratio {}", ratio);
}

#[test]
fn elapsed_grows_with_trials() {
    let mut rng = seeded(5);
    let small = timed(|| estimate_pi(10_000, &mut rng));
    let large = timed(|| estimate_pi(1_000_000, &mut rng));
    assert!(small.value.is_ok() && large.value.is_ok());
    assert!(large.elapsed > small.elapsed);
}
