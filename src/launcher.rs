//! Launcher: run a command with the filter library injected
//!
//! Translates CLI flags into the `PFLOG_*` variables, prepends the library
//! to the platform's preload variable and replaces the current process
//! with the command.

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::cli::Cli;
use crate::config::{FILTER_ENV_VAR, FILTER_STDERR_ENV_VAR, FILTER_STDOUT_ENV_VAR, LOG_ENV_VAR};
use crate::filter::{FilterName, FILTER_DELIMITER, MAX_FILTERS};

#[cfg(not(target_os = "macos"))]
pub const PRELOAD_ENV_VAR: &str = "LD_PRELOAD";
#[cfg(target_os = "macos")]
pub const PRELOAD_ENV_VAR: &str = "DYLD_INSERT_LIBRARIES";

#[cfg(not(target_os = "macos"))]
pub const LIBRARY_FILE_NAME: &str = "libpflog_preload.so";
#[cfg(target_os = "macos")]
pub const LIBRARY_FILE_NAME: &str = "libpflog_preload.dylib";

/// Everything needed to start the filtered command
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub library: PathBuf,
    pub env: Vec<(String, OsString)>,
    pub command: Vec<String>,
}

impl LaunchPlan {
    /// Build a plan from parsed arguments
    ///
    /// `existing_preload` is the current value of the preload variable; the
    /// library is prepended to it rather than replacing it.
    pub fn new(cli: Cli, existing_preload: Option<OsString>) -> Result<Self> {
        if cli.command.is_empty() {
            bail!("Command array is empty");
        }

        for (list, extra) in [("stdout", &cli.stdout), ("stderr", &cli.stderr)] {
            let total = cli.filter.len() + extra.len();
            if total > MAX_FILTERS {
                bail!(
                    "Too many {} filters: {} given, maximum is {}",
                    list,
                    total,
                    MAX_FILTERS
                );
            }
        }

        let mut env = Vec::new();
        for (var, names) in [
            (FILTER_ENV_VAR, &cli.filter),
            (FILTER_STDOUT_ENV_VAR, &cli.stdout),
            (FILTER_STDERR_ENV_VAR, &cli.stderr),
        ] {
            if let Some(value) = join_names(names)? {
                env.push((var.to_string(), OsString::from(value)));
            }
        }
        if cli.debug {
            env.push((LOG_ENV_VAR.to_string(), OsString::from("debug")));
        }

        let library = match cli.library {
            Some(path) => path,
            None => default_library_path()?,
        };
        let library = std::fs::canonicalize(&library).with_context(|| {
            format!(
                "Preload library not found at {} (use --library or PFLOG_LIBRARY)",
                library.display()
            )
        })?;
        env.push((
            PRELOAD_ENV_VAR.to_string(),
            preload_value(&library, existing_preload),
        ));

        Ok(Self {
            library,
            env,
            command: cli.command,
        })
    }

    /// Command with the plan's environment applied
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.command[0]);
        command.args(&self.command[1..]);
        command.envs(self.env.iter().map(|(k, v)| (k, v)));
        command
    }

    /// Replace the current process with the command
    ///
    /// Only returns if exec failed.
    pub fn exec(self) -> anyhow::Error {
        tracing::debug!(library = %self.library.display(), command = ?self.command, "exec");
        let err = self.to_command().exec();
        anyhow::Error::new(err).context(format!("Failed to exec {}", self.command[0]))
    }
}

/// Validate names and join them with `:`
///
/// Returns `None` for an empty list so the variable is left untouched.
pub fn join_names(names: &[String]) -> Result<Option<String>> {
    if names.is_empty() {
        return Ok(None);
    }
    for name in names {
        FilterName::new(name.as_bytes()).with_context(|| format!("Invalid filter name {:?}", name))?;
    }
    Ok(Some(names.join(&char::from(FILTER_DELIMITER).to_string())))
}

/// `libpflog_preload` next to the running launcher executable
pub fn default_library_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate pflog executable")?;
    let dir = exe
        .parent()
        .context("pflog executable has no parent directory")?;
    Ok(dir.join(LIBRARY_FILE_NAME))
}

/// Prepend `library` to an existing preload list
pub fn preload_value(library: &Path, existing: Option<OsString>) -> OsString {
    let mut value = library.as_os_str().to_os_string();
    if let Some(existing) = existing.filter(|e| !e.is_empty()) {
        value.push(":");
        value.push(existing);
    }
    value
}
