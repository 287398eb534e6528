use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tempfile::NamedTempFile;

use crate::gen::Table;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Scientific notation with 18 fractional digits and a signed two digit
/// (or wider) exponent, e.g. 1.000000000000000056e-01
///
/// Rust's own `{:e}` writes the exponent bare (e-1), so it is rebuilt here.
pub fn format_float(v: f64) -> String {
	let s = format!("{:.18e}", v);
	match s.split_once('e') {
		Some((mant, exp)) => match exp.parse::<i32>() {
			Ok(e) => format!("{}e{:+03}", mant, e),
			Err(_) => s,
		},
		// NaN and inf have no exponent part
		None => s.to_lowercase(),
	}
}

fn dest_dir(path: &Path) -> &Path {
	match path.parent() {
		Some(p) if !p.as_os_str().is_empty() => p,
		_ => Path::new("."),
	}
}

// An existing path must open for write; symlinks resolve to their target
fn resolve_target(path: &Path) -> Result<PathBuf> {
	if fs::symlink_metadata(path).is_err() {
		return Ok(path.to_path_buf());
	}
	let target = fs::canonicalize(path)
		.map_err(|e| format!("cannot write \"{}\": {}", path.display(), e))?;
	OpenOptions::new().write(true).open(&target)
		.map_err(|e| format!("cannot write \"{}\": {}", path.display(), e))?;
	if target != path {
		log::debug!("{} resolves to {}", path.display(), target.display());
	}
	Ok(target)
}

/// Write a table as space delimited rows into path
///
/// Rows go to a temp file next to path first and only replace path after
/// everything has been flushed.  A failed write leaves path untouched.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
	let target = resolve_target(path)?;
	let dir = dest_dir(&target);
	let mut tmp = NamedTempFile::new_in(dir)
		.map_err(|e| format!("cannot create temp file in \"{}\": {}", dir.display(), e))?;
	log::debug!("writing to temp file {}", tmp.path().display());

	{
		let mut wtr = WriterBuilder::new()
			.delimiter(b' ')
			.has_headers(false)
			.quote_style(QuoteStyle::Never)
			.terminator(Terminator::Any(b'\n'))
			.from_writer(&mut tmp);
		for row in table.rows() {
			let rec = [format_float(row[0]), format_float(row[1])];
			log::trace!("row: {} {}", rec[0], rec[1]);
			wtr.write_record(&rec)
				.map_err(|e| format!("cannot write row to \"{}\": {}", path.display(), e))?;
		}
		wtr.flush()
			.map_err(|e| format!("cannot flush \"{}\": {}", path.display(), e))?;
	}
	tmp.as_file().sync_all()
		.map_err(|e| format!("cannot sync \"{}\": {}", path.display(), e))?;

	set_final_permissions(&target, &tmp)?;
	tmp.persist(&target)
		.map_err(|e| format!("cannot write \"{}\": {}", path.display(), e.error))?;
	Ok(())
}

// temp files are created owner-only; keep an existing file's mode or use
// the usual 0644 for a new one
#[cfg(unix)]
fn set_final_permissions(path: &Path, tmp: &NamedTempFile) -> Result<()> {
	use std::os::unix::fs::PermissionsExt;
	let perms = match fs::metadata(path) {
		Ok(m) => m.permissions(),
		Err(_) => fs::Permissions::from_mode(0o644),
	};
	fs::set_permissions(tmp.path(), perms)?;
	Ok(())
}

#[cfg(not(unix))]
fn set_final_permissions(_path: &Path, _tmp: &NamedTempFile) -> Result<()> {
	Ok(())
}

#[cfg(test)]
fn read_table(path: &Path) -> Result<Vec<(f64, f64)>> {
	let mut rdr = csv::ReaderBuilder::new()
		.delimiter(b' ')
		.has_headers(false)
		.from_path(path)?;
	let mut v = vec![];
	for rec in rdr.records() {
		let rec = rec?;
		assert_eq!(rec.len(), 2, "expected 2 fields got: {:?}", rec);
		v.push((rec[0].parse::<f64>()?, rec[1].parse::<f64>()?));
	}
	Ok(v)
}

#[test]
fn test_format_float() {
	for t in &[
		(0.0, "0.000000000000000000e+00"),
		(1.0, "1.000000000000000000e+00"),
		(0.1, "1.000000000000000056e-01"),
		(12345.0, "1.234500000000000000e+04"),
		(-2.5, "-2.500000000000000000e+00"),
		(1e100, "1.000000000000000016e+100"),
		(0.0009765625, "9.765625000000000000e-04"),
	] {
		assert_eq!(format_float(t.0), t.1, "format_float of {}", t.0);
	}
	// -2.5e-300 has no exact f64
	assert_eq!(format_float(-2.5e-300), "-2.499999999999999980e-300");
	assert_eq!(format_float(f64::NAN), "nan");
	assert_eq!(format_float(f64::INFINITY), "inf");
	assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
}

#[test]
fn test_format_float_round_trips() {
	for x in crate::gen::linspace(0.0, 0.1, 10) {
		let back: f64 = format_float(x).parse().unwrap();
		assert_eq!(back, x);
	}
}

#[test]
fn test_write_table_round_trip() -> Result<()> {
	let dir = tempfile::tempdir()?;
	let path = dir.path().join("out.txt");
	let table = crate::gen::build_table(&crate::gen::GenCfg::default())?;
	write_table(&path, &table)?;

	let text = fs::read_to_string(&path)?;
	assert_eq!(text.lines().count(), 10);
	assert!(text.ends_with('\n'));
	assert_eq!(text.lines().next(), Some("0.000000000000000000e+00 1.000000000000000000e+00"));
	assert_eq!(text.lines().last(), Some("1.000000000000000056e-01 1.000000000000000000e+00"));

	let back = read_table(&path)?;
	for (i, (a, b)) in back.iter().enumerate() {
		assert!((a - table.rows()[i][0]).abs() < 1e-9);
		assert!((b - 1.0).abs() < 1e-9);
	}
	Ok(())
}

#[test]
fn test_write_table_overwrites() -> Result<()> {
	let dir = tempfile::tempdir()?;
	let path = dir.path().join("out.txt");
	fs::write(&path, "stale content that is longer than the new table would ever be\n".repeat(100))?;
	let table = crate::gen::column_stack(&[0.0, 1.0], &[1.0, 1.0])?;
	write_table(&path, &table)?;
	let text = fs::read_to_string(&path)?;
	assert_eq!(text, "0.000000000000000000e+00 1.000000000000000000e+00\n1.000000000000000000e+00 1.000000000000000000e+00\n");
	assert_eq!(fs::read_dir(dir.path())?.count(), 1, "temp file left behind");
	Ok(())
}

#[test]
fn test_write_table_missing_dir() -> Result<()> {
	let dir = tempfile::tempdir()?;
	let path = dir.path().join("no_such_dir").join("out.txt");
	let table = crate::gen::column_stack(&[0.0], &[1.0])?;
	let err = write_table(&path, &table).unwrap_err();
	assert!(err.to_string().contains("no_such_dir"), "unexpected error: {}", err);
	assert!(!path.exists());
	Ok(())
}

#[cfg(unix)]
#[test]
fn test_write_table_read_only_file() -> Result<()> {
	use std::os::unix::fs::PermissionsExt;

	// root can open a 0444 file for write
	if unsafe { libc::geteuid() } == 0 {
		eprintln!("skipping test_write_table_read_only_file as root");
		return Ok(());
	}
	let dir = tempfile::tempdir()?;
	let path = dir.path().join("out.txt");
	fs::write(&path, "old\n")?;
	fs::set_permissions(&path, fs::Permissions::from_mode(0o444))?;
	let table = crate::gen::column_stack(&[0.0], &[1.0])?;
	let err = write_table(&path, &table).unwrap_err();
	assert!(err.to_string().starts_with("cannot write \""), "unexpected error: {}", err);
	assert_eq!(fs::read_to_string(&path)?, "old\n");
	assert_eq!(fs::metadata(&path)?.permissions().mode() & 0o777, 0o444);
	assert_eq!(fs::read_dir(dir.path())?.count(), 1, "temp file left behind");
	Ok(())
}

#[cfg(unix)]
#[test]
fn test_write_table_follows_symlink() -> Result<()> {
	let dir = tempfile::tempdir()?;
	let real = dir.path().join("real.txt");
	let link = dir.path().join("out.txt");
	fs::write(&real, "old\n")?;
	std::os::unix::fs::symlink(&real, &link)?;

	let table = crate::gen::column_stack(&[0.0], &[1.0])?;
	write_table(&link, &table)?;
	assert!(fs::symlink_metadata(&link)?.file_type().is_symlink(), "link was replaced");
	assert_eq!(fs::read_to_string(&real)?, "0.000000000000000000e+00 1.000000000000000000e+00\n");
	assert_eq!(fs::read_dir(dir.path())?.count(), 2, "temp file left behind");
	Ok(())
}

#[test]
fn test_write_table_onto_directory() -> Result<()> {
	let dir = tempfile::tempdir()?;
	let path = dir.path().join("out.txt");
	fs::create_dir(&path)?;
	let table = crate::gen::column_stack(&[0.0], &[1.0])?;
	let err = write_table(&path, &table).unwrap_err();
	assert!(err.to_string().starts_with("cannot write \""), "unexpected error: {}", err);
	assert!(path.is_dir());
	assert_eq!(fs::read_dir(&path)?.count(), 0);
	assert_eq!(fs::read_dir(dir.path())?.count(), 1, "temp file left behind");
	Ok(())
}
