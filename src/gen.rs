use std::fmt;
use std::path::PathBuf;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Fixed generation settings - nothing here is exposed on the command line
#[derive(Debug, Clone)]
pub struct GenCfg {
	pub start: f64,
	pub stop: f64,
	pub num: usize,
	pub output: PathBuf,
}

impl Default for GenCfg {
	fn default() -> GenCfg {
		GenCfg {
			start: 0.0,
			stop: 0.1,
			num: 10,
			output: PathBuf::from("out.txt"),
		}
	}
}

/// Two column table, row i is (a[i], b[i])
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
	rows: Vec<[f64; 2]>,
}

impl Table {
	pub fn rows(&self) -> &[[f64; 2]] {
		&self.rows
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	#[cfg(test)]
	pub fn column(&self, idx: usize) -> Vec<f64> {
		self.rows.iter().map(|r| r[idx]).collect()
	}
}

#[derive(Debug)]
pub struct LengthMismatch {
	pub left: usize,
	pub right: usize,
}

impl fmt::Display for LengthMismatch {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "cannot column stack sequences of length {} and {}", self.left, self.right)
	}
}

impl std::error::Error for LengthMismatch {}

/// num samples evenly spaced over [start, stop], both ends included
///
/// The last sample is pinned to stop so the endpoint is exact and not
/// the product of accumulated step error.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
	match num {
		0 => vec![],
		1 => vec![start],
		_ => {
			let step = (stop - start) / (num - 1) as f64;
			let mut v: Vec<f64> = (0..num).map(|i| i as f64 * step + start).collect();
			v[num - 1] = stop;
			v
		}
	}
}

pub fn full(num: usize, value: f64) -> Vec<f64> {
	vec![value; num]
}

pub fn ones(num: usize) -> Vec<f64> {
	full(num, 1.0)
}

pub fn column_stack(a: &[f64], b: &[f64]) -> Result<Table> {
	if a.len() != b.len() {
		Err(LengthMismatch { left: a.len(), right: b.len() })?
	}
	Ok(Table {
		rows: a.iter().zip(b.iter()).map(|(x, y)| [*x, *y]).collect(),
	})
}

pub fn build_table(cfg: &GenCfg) -> Result<Table> {
	let a = linspace(cfg.start, cfg.stop, cfg.num);
	let b = ones(cfg.num);
	log::debug!("sequence a: {:?}", a);
	log::debug!("sequence b: {:?}", b);
	column_stack(&a, &b)
}

#[test]
fn test_linspace_default_range() {
	let v = linspace(0.0, 0.1, 10);
	assert_eq!(v.len(), 10);
	assert_eq!(v[0], 0.0);
	assert!((v[9] - 0.1).abs() < 1e-12, "last sample {} not 0.1", v[9]);
	for w in v.windows(2) {
		assert!(w[0] <= w[1], "not non-decreasing: {:?}", w);
	}
	for (i, x) in v.iter().enumerate() {
		let expect = i as f64 * (0.1 - 0.0) / 9.0;
		assert!((x - expect).abs() < 1e-15, "index {} got {} expected {}", i, x, expect);
	}
}

#[test]
fn test_linspace_small_counts() {
	assert!(linspace(0.0, 1.0, 0).is_empty());
	assert_eq!(linspace(3.0, 7.0, 1), vec![3.0]);
	assert_eq!(linspace(3.0, 7.0, 2), vec![3.0, 7.0]);
	assert_eq!(linspace(1.0, 0.0, 3), vec![1.0, 0.5, 0.0]);
}

#[test]
fn test_ones() {
	let v = ones(10);
	assert_eq!(v.len(), 10);
	assert!(v.iter().all(|x| *x == 1.0));
	assert!(ones(0).is_empty());
}

#[test]
fn test_column_stack() -> Result<()> {
	let t = column_stack(&[0.0, 0.5, 1.0], &[1.0, 1.0, 1.0])?;
	assert_eq!(t.len(), 3);
	assert_eq!(t.rows()[1], [0.5, 1.0]);
	assert_eq!(t.column(0), vec![0.0, 0.5, 1.0]);
	assert_eq!(t.column(1), vec![1.0, 1.0, 1.0]);

	let err = column_stack(&[0.0, 1.0], &[1.0]).unwrap_err();
	assert_eq!(err.to_string(), "cannot column stack sequences of length 2 and 1");
	Ok(())
}

#[test]
fn test_build_table_default() -> Result<()> {
	let t = build_table(&GenCfg::default())?;
	assert_eq!(t.len(), 10);
	assert_eq!(t.rows()[0], [0.0, 1.0]);
	assert_eq!(t.rows()[9], [0.1, 1.0]);
	Ok(())
}
