//! Progress-bar-aware logging
//!
//! While a progress bar is drawing, log lines written straight to stderr
//! would tear it. The writer here buffers each event and prints it with the
//! bar suspended.

use indicatif::ProgressBar;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;

/// Bar currently owning the bottom of the terminal, if any
static ACTIVE_BAR: Mutex<Option<ProgressBar>> = Mutex::new(None);

fn set_active_bar(bar: Option<ProgressBar>) {
    if let Ok(mut slot) = ACTIVE_BAR.lock() {
        *slot = bar;
    }
}

fn active_bar() -> Option<ProgressBar> {
    ACTIVE_BAR.lock().ok().and_then(|slot| slot.clone())
}

/// Clears the active bar when dropped
pub struct ActiveBarGuard {
    _private: (),
}

impl Drop for ActiveBarGuard {
    fn drop(&mut self) {
        set_active_bar(None);
    }
}

/// Route log output around `bar` until the guard is dropped
pub fn activate(bar: &ProgressBar) -> ActiveBarGuard {
    set_active_bar(Some(bar.clone()));
    ActiveBarGuard { _private: () }
}

/// `MakeWriter` for the fmt layer
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressAwareStderr;

impl<'a> MakeWriter<'a> for ProgressAwareStderr {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter { buf: Vec::new() }
    }
}

/// Collects one formatted event and emits it on drop
pub struct EventWriter {
    buf: Vec<u8>,
}

impl EventWriter {
    fn emit(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let buf = std::mem::take(&mut self.buf);
        let write = || {
            let mut stderr = io::stderr().lock();
            let _ = stderr.write_all(&buf);
            let _ = stderr.flush();
        };
        match active_bar() {
            Some(bar) => bar.suspend(write),
            None => write(),
        }
    }
}

impl Write for EventWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit();
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        self.emit();
    }
}
