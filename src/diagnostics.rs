//! Diagnostics for the preloaded library
//!
//! The library runs inside someone else's process, so it never installs a
//! global subscriber. It keeps a private [`Dispatch`] writing to stderr and
//! scopes it around its own entry points.

use std::sync::OnceLock;

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

use crate::config::LOG_ENV_VAR;

/// Level used when `PFLOG_LOG` is unset or invalid
pub const DEFAULT_DIRECTIVE: &str = "warn";

static DISPATCH: OnceLock<Dispatch> = OnceLock::new();

fn build_dispatch() -> Dispatch {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .finish();

    Dispatch::new(subscriber)
}

/// Run `f` with the library's own subscriber as the current default
pub fn with_dispatch<T>(f: impl FnOnce() -> T) -> T {
    let dispatch = DISPATCH.get_or_init(build_dispatch);
    tracing::dispatcher::with_default(dispatch, f)
}
