use crate::{Error, Result};

/// Options for the `run` command; values are `None` when not provided on CLI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

/// Parsed command-line intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunOptions),
    ShowHelp,
    ShowVersion,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        if args.is_empty() {
            return Ok(Command::Run(RunOptions::default()));
        }

        let mut iter = args.iter();
        match iter.next().map(|s| s.as_str()) {
            Some("run") => Ok(Command::Run(parse_run_options(&mut iter)?)),
            Some("--help") | Some("-h") => Ok(Command::ShowHelp),
            Some("--version") | Some("-V") => Ok(Command::ShowVersion),
            Some(flag) if flag.starts_with('-') => {
                // Allow omitting the explicit `run` subcommand.
                let mut flags: Vec<String> = Vec::with_capacity(args.len());
                flags.push(flag.to_string());
                flags.extend(iter.map(|s| s.to_string()));
                let mut iter = flags.iter();
                Ok(Command::Run(parse_run_options(&mut iter)?))
            }
            Some(cmd) => Err(Error::InvalidArgs(format!(
                "unknown command '{cmd}', try --help"
            ))),
            None => Ok(Command::Run(RunOptions::default())),
        }
    }

    pub fn help() -> &'static str {
        concat!(
            "epaper-stat - host metrics on a 2.13\" e-paper panel\n",
            "\n",
            "USAGE:\n",
            "  epaper-stat run [--log-level <level>] [--log-file <path>]\n",
            "  epaper-stat --help\n",
            "  epaper-stat --version\n",
            "\n",
            "OPTIONS:\n",
            "  --log-level <level>  error|warn|info|debug|trace (default: info)\n",
            "  --log-file <path>    Append log lines here (default: $EPAPER_STAT_LOG_PATH,\n",
            "                       then epaper_stats.log)\n",
            "  -h, --help           Show this help\n",
            "  -V, --version        Show version\n",
        )
    }

    pub fn print_help() {
        println!("{}", Self::help());
    }
}

fn parse_run_options(iter: &mut std::slice::Iter<String>) -> Result<RunOptions> {
    let mut opts = RunOptions::default();

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--log-level" => {
                opts.log_level = Some(take_value(flag, iter)?);
            }
            "--log-file" => {
                opts.log_file = Some(take_value(flag, iter)?);
            }
            other => {
                return Err(Error::InvalidArgs(format!(
                    "unknown flag '{other}', try --help"
                )));
            }
        }
    }

    Ok(opts)
}

fn take_value(flag: &str, iter: &mut std::slice::Iter<String>) -> Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| Error::InvalidArgs(format!("expected a value after {flag}")))
}
