//! Command-line argument parsing.
//!
//! Usage:
//!   norn [-p<port>] [-f<file>] [-n]
//!
//! `-p` overrides the web interface port, `-f` loads a saved session file
//! before the console starts, `-n` disables the web interface entirely.

use std::path::PathBuf;

use crate::web;

/// Parsed command-line arguments.
#[derive(Debug)]
pub struct CliArgs {
    /// Web interface port (`-p<port>`).
    pub port: u16,
    /// Session file to load at startup (`-f<file>`).
    pub load_file: Option<PathBuf>,
    /// Disable the web interface (`-n`).
    pub no_web: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        CliArgs {
            port: web::DEFAULT_PORT,
            load_file: None,
            no_web: false,
        }
    }
}

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(&raw[1..])
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();
        let Some(flag) = arg.strip_prefix('-') else {
            return Err(format!("unexpected argument: {arg}"));
        };

        match flag.chars().next() {
            Some('p') => {
                let value = flag_value(&flag[1..], argv, &mut i, "-p")?;
                args.port = value
                    .parse()
                    .map_err(|_| format!("-p: invalid port: {value}"))?;
            }
            Some('f') => {
                let value = flag_value(&flag[1..], argv, &mut i, "-f")?;
                args.load_file = Some(PathBuf::from(value));
            }
            Some('n') if flag == "n" => {
                args.no_web = true;
            }
            _ => return Err(format!("unknown option: {arg}")),
        }
        i += 1;
    }
    Ok(args)
}

/// A flag's value, either attached (`-p5021`) or in the next argument
/// (`-p 5021`).
fn flag_value(
    attached: &str,
    argv: &[String],
    i: &mut usize,
    flag: &str,
) -> Result<String, String> {
    if !attached.is_empty() {
        return Ok(attached.to_owned());
    }
    *i += 1;
    match argv.get(*i) {
        Some(next) => Ok(next.clone()),
        None => Err(format!("{flag}: missing value")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
