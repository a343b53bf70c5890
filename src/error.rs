use core::fmt;

/// Errors reported by the expander drivers and the I2C bridge.
///
/// `E` is the error type of the underlying [`I2cHost`](crate::I2cHost).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// A port number, address or pin mask was out of range.
    InvalidArgument,
    /// The I2C bus for the requested port was never initialized.
    InvalidState,
    /// The transport reported a failure.
    ///
    /// Timeouts only show up here once the retry budget is exhausted.  For multi-step accesses
    /// this is the error of the step that failed; later steps were not attempted.
    Transport(E),
}

impl<E: crate::TransportError> Error<E> {
    /// Whether this error is a transport timeout that survived all retries.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Transport(e)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::InvalidState => f.write_str("i2c bus not initialized"),
            Error::Transport(e) => write!(f, "i2c transport error: {:?}", e),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl<E: fmt::Debug> std::error::Error for Error<E> {}
