//! Synthetic CPU load generators
//!
//! Run in a separate terminal while a benchmark phase is being recorded.
//! Each workload repeats a fixed unit of work until asked to stop; the stop
//! flag is checked between cycles.

use rand::Rng;
use std::hint::black_box;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Ranges searched by the two prime workers each cycle
pub const PRIME_RANGES: [(u64, u64); 2] = [(1, 500_000), (500_000, 1_000_000)];

/// Default matrix dimension for the multiply workload
pub const DEFAULT_MATRIX_SIZE: usize = 1000;

/// Block of the product fed to the eigenvalue estimate
const EIGEN_BLOCK: usize = 100;
const POWER_ITERATIONS: usize = 50;

/// A repeatable unit of synthetic load
pub trait Workload {
    fn name(&self) -> &'static str;

    /// Run one unit of work
    fn cycle(&mut self);
}

/// Run `workload` until `stop` is set or `duration` elapses
///
/// Returns the number of completed cycles.
pub fn run_until(workload: &mut dyn Workload, stop: &AtomicBool, duration: Option<Duration>) -> u64 {
    let deadline = duration.map(|d| Instant::now() + d);
    let mut cycles = 0u64;

    while !stop.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        workload.cycle();
        cycles += 1;
        log::debug!("{} cycle {} done", workload.name(), cycles);
    }

    cycles
}

/// Trial-division primality test
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut i = 2u64;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}

/// Primes in `[start, end)`
pub fn find_primes(start: u64, end: u64) -> Vec<u64> {
    (start..end).filter(|n| is_prime(*n)).collect()
}

/// Two-worker prime search over fixed ranges
#[derive(Debug, Clone)]
pub struct PrimeWorkload {
    ranges: Vec<(u64, u64)>,
}

impl Default for PrimeWorkload {
    fn default() -> Self {
        Self {
            ranges: PRIME_RANGES.to_vec(),
        }
    }
}

impl PrimeWorkload {
    pub fn with_ranges(ranges: Vec<(u64, u64)>) -> Self {
        Self { ranges }
    }

    /// One pool run: one thread per range, results joined in range order
    pub fn search(&self) -> Vec<Vec<u64>> {
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .ranges
                .iter()
                .map(|&(start, end)| scope.spawn(move || find_primes(start, end)))
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_default())
                .collect()
        })
    }
}

impl Workload for PrimeWorkload {
    fn name(&self) -> &'static str {
        "prime"
    }

    fn cycle(&mut self) {
        black_box(self.search());
    }
}

/// Square row-major matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    size: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let size = rows.len();
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self { size, data }
    }

    pub fn random<R: Rng>(size: usize, rng: &mut R) -> Self {
        let data = (0..size * size).map(|_| rng.gen::<f64>()).collect();
        Self { size, data }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.size + col]
    }

    pub fn multiply(&self, other: &Matrix) -> Matrix {
        let n = self.size;
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for k in 0..n {
                let a = self.data[i * n + k];
                let row = &other.data[k * n..(k + 1) * n];
                for (out, b) in data[i * n..(i + 1) * n].iter_mut().zip(row) {
                    *out += a * b;
                }
            }
        }
        Matrix { size: n, data }
    }

    /// Top-left `block`×`block` sub-matrix
    pub fn top_left(&self, block: usize) -> Matrix {
        let block = block.min(self.size);
        let data = (0..block)
            .flat_map(|r| (0..block).map(move |c| (r, c)))
            .map(|(r, c)| self.get(r, c))
            .collect();
        Matrix { size: block, data }
    }

    /// Dominant eigenvalue estimate by power iteration
    pub fn dominant_eigenvalue(&self, iterations: usize) -> f64 {
        let n = self.size;
        if n == 0 {
            return 0.0;
        }

        let mut v = vec![1.0 / (n as f64).sqrt(); n];
        let mut lambda = 0.0;
        for _ in 0..iterations {
            let w: Vec<f64> = (0..n)
                .map(|i| (0..n).map(|j| self.get(i, j) * v[j]).sum())
                .collect();
            let norm = w.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm == 0.0 {
                return 0.0;
            }
            lambda = v.iter().zip(&w).map(|(a, b)| a * b).sum();
            v = w.into_iter().map(|x| x / norm).collect();
        }
        lambda
    }
}

/// Random matrix multiply followed by an eigenvalue estimate
#[derive(Debug)]
pub struct MatrixWorkload {
    size: usize,
    rng: rand::rngs::ThreadRng,
}

impl MatrixWorkload {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            rng: rand::thread_rng(),
        }
    }
}

impl Default for MatrixWorkload {
    fn default() -> Self {
        Self::new(DEFAULT_MATRIX_SIZE)
    }
}

impl Workload for MatrixWorkload {
    fn name(&self) -> &'static str {
        "matrix"
    }

    fn cycle(&mut self) {
        let a = Matrix::random(self.size, &mut self.rng);
        let b = Matrix::random(self.size, &mut self.rng);
        let c = a.multiply(&b);
        black_box(c.top_left(EIGEN_BLOCK).dominant_eigenvalue(POWER_ITERATIONS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_prime() {
        let primes: Vec<u64> = (0..30).filter(|n| is_prime(*n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert!(is_prime(499_979));
        assert!(!is_prime(500_000));
    }

    #[test]
    fn test_prime_pool_keeps_range_order() {
        let workload = PrimeWorkload::with_ranges(vec![(1, 20), (20, 40)]);
        let results = workload.search();
        assert_eq!(results, vec![vec![2, 3, 5, 7, 11, 13, 17, 19], vec![23, 29, 31, 37]]);
    }

    #[test]
    fn test_matrix_multiply() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = Matrix::from_rows(&[vec![5.0, 6.0], vec![7.0, 8.0]]);
        let c = a.multiply(&b);
        assert_eq!(c, Matrix::from_rows(&[vec![19.0, 22.0], vec![43.0, 50.0]]));
        assert_eq!(c.top_left(1).get(0, 0), 19.0);
        assert_eq!(c.top_left(10).size(), 2);
    }

    #[test]
    fn test_dominant_eigenvalue() {
        let m = Matrix::from_rows(&[vec![2.0, 0.0], vec![0.0, 1.0]]);
        assert!((m.dominant_eigenvalue(60) - 2.0).abs() < 1e-6);
        assert_eq!(Matrix::from_rows(&[]).dominant_eigenvalue(10), 0.0);
    }

    struct Counter(u32);

    impl Workload for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        fn cycle(&mut self) {
            self.0 += 1;
        }
    }

    #[test]
    fn test_run_until_honours_stop_flag() {
        let stop = AtomicBool::new(true);
        let mut counter = Counter(0);
        assert_eq!(run_until(&mut counter, &stop, None), 0);
        assert_eq!(counter.0, 0);
    }

    #[test]
    fn test_run_until_honours_duration() {
        let stop = AtomicBool::new(false);
        let mut counter = Counter(0);
        let cycles = run_until(&mut counter, &stop, Some(Duration::from_millis(20)));
        assert_eq!(cycles, counter.0 as u64);
        assert!(cycles > 0);
    }

    #[test]
    fn test_matrix_workload_cycle() {
        let mut workload = MatrixWorkload::new(8);
        let stop = AtomicBool::new(false);
        assert!(run_until(&mut workload, &stop, Some(Duration::from_millis(5))) > 0);
    }
}
