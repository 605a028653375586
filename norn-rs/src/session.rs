//! Saving and reloading the definitions of a session.
//!
//! The persisted form is a single line of `name = (expression); `
//! statements, one per bound name, sorted by name.  Loading parses the
//! whole file as one list expression and evaluates it against the live
//! environment, so a reload goes through the normal definition path and is
//! subject to the same mail-loop check as typed input.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::environment::{Environment, MailLoopError};
use crate::eval;
use crate::parser::{self, SyntaxError};

// ── SessionError ──────────────────────────────────────────────────────────────

/// A failed save or load.
#[derive(Debug)]
pub enum SessionError {
    Io(io::Error),
    Syntax(SyntaxError),
    MailLoop(MailLoopError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Io(e) => write!(f, "{e}"),
            SessionError::Syntax(e) => write!(f, "{e}"),
            SessionError::MailLoop(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Io(e) => Some(e),
            SessionError::Syntax(e) => Some(e),
            SessionError::MailLoop(e) => Some(e),
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(e: io::Error) -> Self {
        SessionError::Io(e)
    }
}

impl From<SyntaxError> for SessionError {
    fn from(e: SyntaxError) -> Self {
        SessionError::Syntax(e)
    }
}

impl From<MailLoopError> for SessionError {
    fn from(e: MailLoopError) -> Self {
        SessionError::MailLoop(e)
    }
}

// ── Save / load ───────────────────────────────────────────────────────────────

/// Render every binding as a reparsable definition statement.
pub fn render(env: &Environment) -> String {
    let mut out = String::new();
    for name in env.names() {
        out.push_str(&format!("{} = ({}); ", name, env.get(&name)));
    }
    out
}

/// Write all current definitions to `path`.
pub fn save(env: &Environment, path: &Path) -> Result<(), SessionError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, render(env))?;
    Ok(())
}

/// Parse the contents of `path` and replay its definitions into `env`.
pub fn load(env: &Environment, path: &Path) -> Result<(), SessionError> {
    let text = std::fs::read_to_string(path)?;
    let parsed = parser::parse(text.trim())?;
    eval::recipients(&parsed, env)?;
    Ok(())
}

/// Default session file, under the platform data directory.
pub fn default_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "norn")?;
    Some(dirs.data_dir().join("session.norn"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
