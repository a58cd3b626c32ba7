use super::Error;

/// Error when the resolution driver keeps producing new entities past its
/// configured round ceiling.
#[derive(Debug)]
pub(super) struct RoundLimitError {
    max_rounds: usize,
}

impl std::error::Error for RoundLimitError {}

impl core::fmt::Display for RoundLimitError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "resolution did not reach a fixed point within {} rounds",
            self.max_rounds
        )
    }
}

impl Error {
    /// Creates a round limit error.
    pub fn round_limit(max_rounds: usize) -> Error {
        Error::from(super::ErrorKind::RoundLimit(RoundLimitError { max_rounds }))
    }

    /// Returns `true` if this error is a round limit error.
    pub fn is_round_limit(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::RoundLimit(_))
    }
}
