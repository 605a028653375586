//! Interactive console for list expressions.
//!
//! Reads expressions line by line from stdin, evaluates them against the
//! shared session environment, and prints the resulting recipient list.
//! Errors are reported as one-line messages and the loop continues with
//! the prior state intact.
//!
//! Commands (anything else starting with `!` is reported as unknown):
//!
//! | Command | Action |
//! |---------|--------|
//! | `!save [file]` | write current definitions (default platform data dir) |
//! | `!load <file>` | replay definitions from a file |
//! | `!quit` | exit the console |

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::ast::Recipient;
use crate::environment::Environment;
use crate::eval;
use crate::parser;
use crate::session;

/// Printed for an empty recipient set.
pub const EMPTY_LIST: &str = "{}";

/// Comma-joined recipient list, or `{}` when empty.
pub fn format_recipients(recipients: &BTreeSet<Recipient>) -> String {
    if recipients.is_empty() {
        return EMPTY_LIST.to_owned();
    }
    let addrs: Vec<&str> = recipients.iter().map(Recipient::as_str).collect();
    addrs.join(", ")
}

/// Run the read-eval-print loop until EOF or `!quit`.
pub async fn run(env: Arc<Environment>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let line = line.trim();

        let output = match line {
            "" => EMPTY_LIST.to_owned(),
            "!quit" => break,
            _ if line.starts_with('!') => run_command(&env, line),
            _ => evaluate(&env, line),
        };
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
    Ok(())
}

fn evaluate(env: &Environment, input: &str) -> String {
    match parser::parse(input) {
        Ok(expr) => match eval::recipients(&expr, env) {
            Ok(recipients) => format_recipients(&recipients),
            Err(e) => e.to_string(),
        },
        Err(e) => e.to_string(),
    }
}

fn run_command(env: &Environment, line: &str) -> String {
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((c, a)) => (c, Some(a.trim())),
        None => (line, None),
    };

    match command {
        "!save" => {
            let path = match arg {
                Some(a) => PathBuf::from(a),
                None => match session::default_path() {
                    Some(p) => p,
                    None => return "!save: no default session path available".to_owned(),
                },
            };
            match session::save(env, &path) {
                Ok(()) => format!("saved {} definitions to {}", env.names().len(), path.display()),
                Err(e) => format!("!save: {e}"),
            }
        }
        "!load" => {
            let Some(a) = arg else {
                return "!load: expected a file name".to_owned();
            };
            let path = PathBuf::from(a);
            match session::load(env, &path) {
                Ok(()) => format!("loaded {}", path.display()),
                Err(e) => format!("!load: {e}"),
            }
        }
        other => format!("unknown command {other}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ListName;

    fn set(addrs: &[&str]) -> BTreeSet<Recipient> {
        addrs.iter().map(|a| Recipient::new(a).unwrap()).collect()
    }

    #[test]
    fn format_empty_set() {
        assert_eq!(format_recipients(&set(&[])), "{}");
    }

    #[test]
    fn format_is_sorted_and_comma_joined() {
        assert_eq!(format_recipients(&set(&["c@d", "a@b"])), "a@b, c@d");
    }

    #[test]
    fn evaluate_reports_syntax_errors() {
        let env = Environment::new();
        let out = evaluate(&env, "a@@b");
        assert!(out.contains("syntax error"), "got: {out}");
    }

    #[test]
    fn evaluate_reports_mail_loops_and_keeps_state() {
        let env = Environment::new();
        assert_eq!(evaluate(&env, "a = b"), "{}");
        let out = evaluate(&env, "b = a");
        assert!(out.contains("mail loop"), "got: {out}");
        assert_eq!(env.get(&ListName::new("b").unwrap()), crate::ast::ListExpr::Empty);
    }

    #[test]
    fn evaluate_prints_recipients() {
        let env = Environment::new();
        assert_eq!(evaluate(&env, "c@d, a@b"), "a@b, c@d");
    }

    #[test]
    fn unknown_command_is_reported() {
        let env = Environment::new();
        assert!(run_command(&env, "!frobnicate").contains("unknown command"));
    }

    #[test]
    fn load_missing_file_is_an_error_message() {
        let env = Environment::new();
        let out = run_command(&env, "!load /nonexistent/definitely-missing.norn");
        assert!(out.starts_with("!load:"), "got: {out}");
    }
}
