#![forbid(unsafe_code)]

//! Opt-in stderr tracing for generation hand-offs.
//!
//! Set `INSPECT_DEBUG_TRACE=1` to print one line per selection change,
//! worker start and exit, and finalize decision, tagged with the emitting
//! thread. Useful when no `tracing` subscriber is installed. When unset the
//! macro costs a single static bool load.
//!
//! ```ignore
//! use inspect_runtime::debug_trace;
//! debug_trace!("worker started for {}", generation);
//! ```

use std::sync::LazyLock;
use std::thread;
use std::time::Instant;

static DEBUG_TRACE_ENABLED: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("INSPECT_DEBUG_TRACE")
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
});

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Whether `INSPECT_DEBUG_TRACE` was enabled at first use.
#[inline]
pub fn is_enabled() -> bool {
    *DEBUG_TRACE_ENABLED
}

/// Milliseconds since the first trace call.
#[inline]
pub fn elapsed_ms() -> u64 {
    START_TIME.elapsed().as_millis() as u64
}

/// Name of the calling thread, or `"?"` for unnamed threads.
pub fn thread_label() -> String {
    thread::current().name().unwrap_or("?").to_owned()
}

/// Print a timestamped, thread-tagged line to stderr when enabled.
#[macro_export]
macro_rules! debug_trace {
    ($($arg:tt)*) => {
        if $crate::debug_trace::is_enabled() {
            eprintln!(
                "[INSPECT {:>8}ms {}] {}",
                $crate::debug_trace::elapsed_ms(),
                $crate::debug_trace::thread_label(),
                format_args!($($arg)*)
            );
        }
    };
}
