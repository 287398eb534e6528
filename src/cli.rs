use structopt::StructOpt;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(StructOpt, Debug, Clone)]
#[structopt(
global_settings(& [structopt::clap::AppSettings::ColoredHelp, structopt::clap::AppSettings::DeriveDisplayOrder]),
name = "colstack",
)]
/// Write 10 evenly spaced samples over [0, 0.1] next to a column of ones into ./out.txt
///
/// There is nothing to configure.  Run it and out.txt is (over)written.
pub struct CliCfg {
    #[structopt(short = "v", parse(from_occurrences))]
    /// Verbosity - use more than one v for greater detail
    ///
    /// Diagnostics go to stderr only and never change out.txt
    pub verbose: usize,
}

pub fn verbosity_to_log_level(verbose: usize) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn get_cli() -> Result<CliCfg> {
    let cfg: CliCfg = CliCfg::from_args();
    Ok(cfg)
}

pub fn init_logging(cfg: &CliCfg) {
    // RUST_LOG still wins when set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(verbosity_to_log_level(cfg.verbose)))
        .format_timestamp(None)
        .init();
    if cfg.verbose > 1 {
        log::debug!("CLI options: {:?}", cfg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_args_is_quiet() {
        let cfg = CliCfg::from_iter(&["colstack"]);
        assert_eq!(cfg.verbose, 0);
        assert_eq!(verbosity_to_log_level(cfg.verbose), "warn");
    }

    #[test]
    fn verbosity_levels() {
        for (args, level) in &[(vec!["colstack", "-v"], "info"), (vec!["colstack", "-vv"], "debug"), (vec!["colstack", "-vvvv"], "trace")] {
            let cfg = CliCfg::from_iter(args);
            assert_eq!(verbosity_to_log_level(cfg.verbose), *level, "args {:?}", args);
        }
    }

    #[test]
    fn positional_args_rejected() {
        assert!(CliCfg::from_iter_safe(&["colstack", "out2.txt"]).is_err());
    }
}
