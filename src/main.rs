use std::error::Error;

mod cli;
mod gen;
mod savetxt;

use cli::{get_cli, init_logging};
use gen::{build_table, GenCfg};
use savetxt::write_table;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", &err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = get_cli()?;
    init_logging(&cli);
    generate_and_write(&GenCfg::default())
}

/// Generate the sample table and write it to cfg.output
fn generate_and_write(cfg: &GenCfg) -> Result<(), Box<dyn Error>> {
    let table = build_table(cfg)?;
    log::info!("writing {} rows to {}", table.len(), cfg.output.display());
    write_table(&cfg.output, &table)?;
    log::info!("done");
    Ok(())
}

#[test]
fn test_generate_and_write_is_idempotent() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let cfg = GenCfg { output: dir.path().join("out.txt"), ..GenCfg::default() };
    generate_and_write(&cfg)?;
    let first = std::fs::read(&cfg.output)?;
    generate_and_write(&cfg)?;
    let second = std::fs::read(&cfg.output)?;
    assert_eq!(first, second);
    assert_eq!(String::from_utf8(first)?.lines().count(), 10);
    Ok(())
}
