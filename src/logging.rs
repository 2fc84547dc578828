//! Tracing setup for applications embedding Rivulet.
//!
//! The engine and its renderers only emit `tracing` events. Applications that do not
//! install their own subscriber can call [`install_tracing`] once at startup.

use std::io::{self, Write};
use std::sync::Once;

use tracing_subscriber::fmt::{self, writer::MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const TRACING_PREFIX: &str = "[rivulet] ";
const DEFAULT_FILTER: &str = "info";

static TRACING_INSTALLED: Once = Once::new();

/// Installs a stderr subscriber filtered by `RUST_LOG`, defaulting to `info` (idempotent).
pub fn install_tracing() {
    install_tracing_with(DEFAULT_FILTER);
}

/// Installs a stderr subscriber filtered by `RUST_LOG`, falling back to `default_filter`
/// when the variable is unset or invalid (idempotent).
///
/// Only the first call in a process has any effect. If another subscriber is already
/// installed the call is a no-op apart from a note on stderr.
pub fn install_tracing_with(default_filter: &str) {
    TRACING_INSTALLED.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        let console = fmt::layer()
            .with_writer(PrefixedWriter)
            .with_ansi(false)
            .with_target(true)
            .with_filter(filter);

        match tracing_subscriber::registry().with(console).try_init() {
            Ok(()) => tracing::debug!(default_filter, "subscriber installed"),
            Err(_) => eprintln!("{TRACING_PREFIX}a tracing subscriber is already installed"),
        }
    });
}

/// Writes every log line to stderr behind [`TRACING_PREFIX`].
struct PrefixedWriter;

impl<'a> MakeWriter<'a> for PrefixedWriter {
    type Writer = PrefixedLine<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        PrefixedLine {
            inner: io::stderr(),
            wrote_prefix: false,
        }
    }
}

struct PrefixedLine<W> {
    inner: W,
    wrote_prefix: bool,
}

impl<W: Write> Write for PrefixedLine<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.wrote_prefix {
            self.inner.write_all(TRACING_PREFIX.as_bytes())?;
            self.wrote_prefix = true;
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_written_once_per_line() {
        let mut line = PrefixedLine {
            inner: Vec::new(),
            wrote_prefix: false,
        };
        line.write_all(b"mounted").expect("write");
        line.write_all(b" root").expect("write");
        assert_eq!(line.inner, b"[rivulet] mounted root");
    }

    #[test]
    fn install_is_idempotent() {
        install_tracing_with("debug");
        install_tracing();
        assert!(TRACING_INSTALLED.is_completed());
        tracing::info!("still routed after a repeated install");
    }
}
