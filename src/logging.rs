//! Diagnostic logging to stderr.
//!
//! Standard output carries the selected line, so every diagnostic goes to
//! stderr. The filter comes from `TOFI_LOG` (`EnvFilter` syntax) and falls
//! back to the supplied default directive.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TOFI_LOG";
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Installs the global subscriber. Returns `false` when one was already
/// installed, which is harmless.
pub fn init(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::init;

    #[test]
    fn second_init_is_a_noop() {
        init("debug");
        assert!(!init("debug"));
    }
}
