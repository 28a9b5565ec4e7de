//! Diagnostic logging setup.
//!
//! Library code logs through `tracing` macros; the binary installs a compact
//! fmt subscriber on stderr so the report on stdout stays clean.

use is_terminal::IsTerminal;
use std::sync::OnceLock;
use tracing::Level;

/// Level for a run: DEBUG when verbose output was requested, INFO otherwise
pub fn level_for(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::INFO }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(level: Level) {
    static INITIALISED: OnceLock<()> = OnceLock::new();

    INITIALISED.get_or_init(|| {
        let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(use_ansi)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .compact()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
