//! Unified error type for gpio2hid.
//!
//! Burst-level failures (`UnsupportedSymbol`, `ChannelWrite`, ...) are
//! reported by the pipeline and never stop it unless the channel is gone.
//! Startup failures (`SourceUnavailable`, `ChannelUnavailable`, `Gadget`,
//! `Config`) are fatal and surface through `main`.

use std::io;
use std::path::PathBuf;

/// Top-level error type used across the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Keycode table / encoder
    /// The symbol has no entry in the keycode table.
    #[error("unsupported symbol {symbol:?} at position {index}")]
    UnsupportedSymbol { symbol: char, index: usize },

    /// The sequence does not fit in one burst.
    #[error("sequence of {len} symbols exceeds the {max}-symbol burst limit")]
    SequenceTooLong { len: usize, max: usize },

    // Report channel
    /// The channel rejected a report; `sent` reports went out before it.
    #[error("report write failed after {sent} reports: {source}")]
    ChannelWrite {
        sent: usize,
        #[source]
        source: ChannelError,
    },

    /// The sink has already released its channel.
    #[error("report channel is closed")]
    ChannelClosed,

    /// Shutdown was observed between two writes.
    #[error("burst cancelled after {sent} reports")]
    BurstCancelled { sent: usize },

    /// The gadget device node could not be opened.
    #[error("report channel {} unavailable: {source}", path.display())]
    ChannelUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // Edge source
    /// The GPIO line could not be requested.
    #[error("edge source {}:{offset} unavailable: {reason}", chip.display())]
    SourceUnavailable {
        chip: PathBuf,
        offset: u32,
        reason: String,
    },

    // Debounce
    /// A zero debounce window was configured.
    #[error("invalid debounce window of {window_ms} ms")]
    InvalidDebounceConfig { window_ms: u64 },

    // Gadget provisioning
    /// A configfs attribute or directory could not be written.
    #[error("gadget provisioning failed at {}: {source}", path.display())]
    Gadget {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No USB device controller is available to bind the gadget to.
    #[error("no USB device controller found in {}", .0.display())]
    NoUdc(PathBuf),

    // Configuration
    /// Settings could not be read, parsed or validated.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// More lines were configured than the pipeline can serve.
    #[error("{count} lines configured, at most {max} supported")]
    TooManyLines { count: usize, max: usize },

    /// No line is configured at this index.
    #[error("no line at index {0}")]
    UnknownLine(usize),
}

impl Error {
    /// Returns `true` if the failure means the report channel cannot be
    /// written any more and the pipeline should shut down.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::ChannelWrite { source, .. } => source.is_unrecoverable(),
            Error::ChannelClosed => true,
            _ => false,
        }
    }
}

/// Failures reported by a [`ReportChannel`](crate::usb::sink::ReportChannel).
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel handle was already closed.
    #[error("channel closed")]
    Closed,

    /// The device accepted only part of a report.
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// Underlying I/O error from the device node.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ChannelError {
    /// Whether further writes to the same handle are pointless.
    pub fn is_unrecoverable(&self) -> bool {
        match self {
            ChannelError::Closed => true,
            ChannelError::ShortWrite { .. } => false,
            // The gadget driver's errors once the host side or the UDC is gone.
            ChannelError::Io(e) => matches!(
                e.raw_os_error(),
                Some(libc::ENODEV | libc::ESHUTDOWN | libc::EPIPE | libc::ENOTCONN)
            ),
        }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_gadget_is_fatal() {
        let err = Error::ChannelWrite {
            sent: 2,
            source: ChannelError::Io(io::Error::from_raw_os_error(libc::ESHUTDOWN)),
        };
        assert!(err.is_fatal());

        for errno in [libc::ENODEV, libc::EPIPE, libc::ENOTCONN] {
            let err = Error::ChannelWrite {
                sent: 0,
                source: ChannelError::Io(io::Error::from_raw_os_error(errno)),
            };
            assert!(err.is_fatal(), "errno {errno}");
        }
        assert!(Error::ChannelClosed.is_fatal());
    }

    #[test]
    fn transient_write_errors_are_not_fatal() {
        let err = Error::ChannelWrite {
            sent: 1,
            source: ChannelError::Io(io::Error::from(io::ErrorKind::Interrupted)),
        };
        assert!(!err.is_fatal());

        for errno in [libc::EAGAIN, libc::EIO, libc::EINTR] {
            let err = Error::ChannelWrite {
                sent: 0,
                source: ChannelError::Io(io::Error::from_raw_os_error(errno)),
            };
            assert!(!err.is_fatal(), "errno {errno}");
        }

        let err = Error::ChannelWrite {
            sent: 1,
            source: ChannelError::ShortWrite { written: 3, expected: 8 },
        };
        assert!(!err.is_fatal());
        assert!(!Error::UnsupportedSymbol { symbol: 'é', index: 0 }.is_fatal());
    }

    #[test]
    fn messages_name_the_offender() {
        let err = Error::UnsupportedSymbol { symbol: 'é', index: 3 };
        assert_eq!(err.to_string(), "unsupported symbol 'é' at position 3");

        let err = Error::SourceUnavailable {
            chip: PathBuf::from("/dev/gpiochip0"),
            offset: 16,
            reason: "busy".into(),
        };
        assert_eq!(err.to_string(), "edge source /dev/gpiochip0:16 unavailable: busy");
    }
}
