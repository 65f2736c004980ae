//! Git identity configurator.
//!
//! Identity is resolved at most once per container lifetime, with strict
//! precedence: an existing identity in `~/.gitconfig` wins over a
//! host-mounted config, which wins over prompting, which falls back to
//! placeholder values when the session is non-interactive. The hook path is
//! repaired on every run — a host config copied in without it must not
//! leave the hooks disconnected.

use crate::error::{BootError, Result};
use crate::paths::Paths;
use crate::stage::StageReport;
use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;
use std::process::Command;

pub const DEFAULT_NAME: &str = "Developer";
pub const DEFAULT_EMAIL: &str = "developer@localhost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Existing,
    HostMounted,
    Prompted,
    Defaults,
}

// ---------------------------------------------------------------------------
// Interactivity
// ---------------------------------------------------------------------------

/// True when prompting on the controlling terminal is not an option.
/// Any one condition suffices: the web terminal is enabled (prompts would
/// race the daemon for stdin), stdin is not a terminal, or the terminal
/// type is absent or "dumb".
pub fn non_interactive(web_terminal_enabled: bool) -> bool {
    decide_non_interactive(
        web_terminal_enabled,
        std::io::stdin().is_terminal(),
        std::env::var("TERM").ok().as_deref(),
    )
}

fn decide_non_interactive(
    web_terminal_enabled: bool,
    stdin_is_terminal: bool,
    term: Option<&str>,
) -> bool {
    web_terminal_enabled
        || !stdin_is_terminal
        || match term {
            None => true,
            Some(t) => t.is_empty() || t == "dumb",
        }
}

// ---------------------------------------------------------------------------
// Prompting
// ---------------------------------------------------------------------------

/// Synchronous question/answer on the controlling terminal. Abstracted so
/// tests can script answers.
pub trait IdentityPrompt {
    fn ask(&mut self, question: &str) -> std::io::Result<String>;
}

pub struct TerminalPrompt;

impl IdentityPrompt for TerminalPrompt {
    fn ask(&mut self, question: &str) -> std::io::Result<String> {
        print!("{question}");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Whether a gitconfig file already carries `user.name`. A plain scan of
/// the `[user]` section — no subprocess, so the precedence decision is
/// cheap and testable.
pub fn has_identity(gitconfig: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(gitconfig) else {
        return false;
    };
    let mut in_user = false;
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_user = line == "[user]";
        } else if in_user {
            if let Some((key, value)) = line.split_once('=') {
                if key.trim() == "name" && !value.trim().is_empty() {
                    return true;
                }
            }
        }
    }
    false
}

/// Resolve and persist the git identity, then apply the repository-
/// independent defaults and repair the hook path. Fatal on any `git config`
/// failure — nothing downstream is safe with a broken git setup.
pub fn configure(
    paths: &Paths,
    web_terminal_enabled: bool,
    prompt: &mut dyn IdentityPrompt,
) -> Result<StageReport> {
    let gitconfig = paths.gitconfig();

    let source = if has_identity(&gitconfig) {
        IdentitySource::Existing
    } else if paths.host_gitconfig.is_file() {
        // Copy the host config verbatim; its identity becomes ours.
        std::fs::copy(&paths.host_gitconfig, &gitconfig)?;
        IdentitySource::HostMounted
    } else if non_interactive(web_terminal_enabled) {
        git_set(&gitconfig, "user.name", DEFAULT_NAME)?;
        git_set(&gitconfig, "user.email", DEFAULT_EMAIL)?;
        IdentitySource::Defaults
    } else {
        let name = prompt.ask("Git user name: ")?;
        let email = prompt.ask("Git email: ")?;
        let name = if name.is_empty() {
            DEFAULT_NAME
        } else {
            name.as_str()
        };
        let email = if email.is_empty() {
            DEFAULT_EMAIL
        } else {
            email.as_str()
        };
        git_set(&gitconfig, "user.name", name)?;
        git_set(&gitconfig, "user.email", email)?;
        IdentitySource::Prompted
    };

    // Repository-independent defaults; harmless if the resolved config
    // already sets them.
    git_set(&gitconfig, "init.defaultBranch", "main")?;
    git_set(&gitconfig, "pull.rebase", "false")?;

    // Every run, not just first: a host config copied above may lack the
    // hook path, and an older container may predate the hooks directory.
    git_set(
        &gitconfig,
        "core.hooksPath",
        &paths.hooks_dir().to_string_lossy(),
    )?;

    let detail = match source {
        IdentitySource::Existing => "using existing git identity".to_string(),
        IdentitySource::HostMounted => "copied host-mounted git config".to_string(),
        IdentitySource::Prompted => "identity set interactively".to_string(),
        IdentitySource::Defaults => {
            format!("non-interactive, using {DEFAULT_NAME} <{DEFAULT_EMAIL}>")
        }
    };
    Ok(StageReport::ok("git-identity", detail))
}

fn git_set(gitconfig: &Path, key: &str, value: &str) -> Result<()> {
    let output = Command::new("git")
        .arg("config")
        .arg("--file")
        .arg(gitconfig)
        .arg(key)
        .arg(value)
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BootError::GitNotFound,
            _ => BootError::Io(e),
        })?;
    if !output.status.success() {
        return Err(BootError::GitConfig {
            key: key.to_string(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
