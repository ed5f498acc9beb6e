use std::fmt;
use std::time::{Duration, Instant};

/// A value together with the wall time it took to produce.
#[derive(Debug, Clone, Copy)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

/// Runs `f`, reading the clock immediately before and after.
pub fn timed<T, F: FnOnce() -> T>(f: F) -> Timed<T> {
    let start = Instant::now();
    let value = f();
    let elapsed = start.elapsed();
    Timed { value, elapsed }
}

impl<T> Timed<T> {
    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Timed<U> {
        Timed {
            value: f(self.value),
            elapsed: self.elapsed,
        }
    }
}

impl<T, E> Timed<Result<T, E>> {
    /// Moves the error out so `?` can be applied to a timed fallible run.
    pub fn transpose(self) -> Result<Timed<T>, E> {
        let elapsed = self.elapsed;
        self.value.map(|value| Timed { value, elapsed })
    }
}

/// The two report lines: result and elapsed seconds, six decimals each.
impl fmt::Display for Timed<f64> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Result: {:.6}", self.value)?;
        write!(f, "Elapsed time: {:.6}", self.seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_format() {
        let t = Timed {
            value: 3.14159265,
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(t.to_string(), "Result: 3.141593\nElapsed time: 1.500000");
    }

    #[test]
    fn elapsed_covers_the_closure() {
        let t = timed(|| std::thread::sleep(Duration::from_millis(5)));
        assert!(t.elapsed >= Duration::from_millis(5));
    }

    #[test]
    fn transpose_keeps_elapsed() {
        let t: Timed<Result<u8, String>> = Timed {
            value: Ok(1),
            elapsed: Duration::from_secs(2),
        };
        let t = t.transpose().unwrap();
        assert_eq!((t.value, t.elapsed), (1, Duration::from_secs(2)));
    }
}
