use std::process::{Command, Output};

fn pi_group(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pi-group"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("SIMPLE_PI_SPAWNED")
        .output()
        .unwrap()
}

fn value_after(stdout: &str, prefix: &str) -> f64 {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .unwrap_or_else(|| panic!("no {:?} line in {}", prefix, stdout))
        .parse()
        .unwrap()
}

#[test]
fn every_rank_says_hello_once() {
    let out = pi_group(&["hello", "-p", "3"]);
    assert!(out.status.success(), "{:?}", out);

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.lines().filter(|l| l.starts_with("Hello world")).count(), 1);
    assert_eq!(stdout.lines().filter(|l| l.starts_with("Goodbye world")).count(), 2);
    for rank in 0..3 {
        let needle = format!("rank {} out of 3 processors", rank);
        assert!(stdout.contains(&needle), "{}", stdout);
    }
}

#[test]
fn trapezoid_sums_agree_across_ranks() {
    let out = pi_group(&["trapezoid", "-n", "1000", "-p", "3"]);
    assert!(out.status.success(), "{:?}", out);

    let stdout = String::from_utf8(out.stdout).unwrap();
    let sent = value_after(&stdout, "Result: ");
    let gathered = value_after(&stdout, "Gathered: ");
    assert!((sent - gathered).abs() < 2e-6, "{}", stdout);
    assert!((sent - std::f64::consts::PI).abs() < 1e-5, "{}", stdout);
    assert!(value_after(&stdout, "Elapsed time: ") >= 0.0);
}

#[test]
fn monte_carlo_covers_every_sample() {
    let out = pi_group(&["monte-carlo", "-n", "30001", "-p", "4"]);
    assert!(out.status.success(), "{:?}", out);

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(value_after(&stdout, "Samples: "), 30001.0);
    let pi = value_after(&stdout, "Result: ");
    assert!((pi - std::f64::consts::PI).abs() < 0.1, "{}", stdout);
}

#[test]
fn bad_arguments_fail_before_spawning() {
    let out = pi_group(&["monte-carlo", "-n", "0", "-p", "3"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());

    let out = pi_group(&["hello", "-p", "0"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("Initialization error"), "{}", stderr);
}
