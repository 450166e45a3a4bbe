//! Terminal outcome of a poll session.

/// Exactly one of these ends every [`start`](crate::poll::CancellablePoller::start).
/// Each variant carries the last fetched value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollResult<T> {
    /// The matcher accepted the value.
    FinalResult(T),

    /// The retry budget ran out without a match.
    TimeOut(T),

    /// `cancel()` was observed before a match.
    Cancel(T),
}

impl<T> PollResult<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::FinalResult(value) | Self::TimeOut(value) | Self::Cancel(value) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::FinalResult(value) | Self::TimeOut(value) | Self::Cancel(value) => value,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::FinalResult(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimeOut(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancel(_))
    }

    /// Transform the carried value, keeping the outcome.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PollResult<U> {
        match self {
            Self::FinalResult(value) => PollResult::FinalResult(f(value)),
            Self::TimeOut(value) => PollResult::TimeOut(f(value)),
            Self::Cancel(value) => PollResult::Cancel(f(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_agree_with_variant() {
        let done = PollResult::FinalResult("linked");
        assert!(done.is_final() && !done.is_timeout() && !done.is_cancelled());
        assert_eq!(*done.value(), "linked");

        let timed_out = PollResult::TimeOut(3);
        assert!(timed_out.is_timeout());
        assert_eq!(timed_out.into_value(), 3);

        assert!(PollResult::Cancel(()).is_cancelled());
    }

    #[test]
    fn map_keeps_outcome() {
        assert_eq!(PollResult::Cancel(2).map(|v| v * 10), PollResult::Cancel(20));
        assert_eq!(
            PollResult::FinalResult("a").map(str::len),
            PollResult::FinalResult(1)
        );
    }
}
