//! Request tokens for the stale-response guard.

/// Identity of one issued fetch. Ordered by issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Raw counter value, for logging.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues strictly increasing tokens. One source per state machine.
#[derive(Debug, Clone, Default)]
pub struct TokenSource {
    last: u64,
}

impl TokenSource {
    /// Next token, greater than every token issued before.
    pub fn issue(&mut self) -> RequestToken {
        self.last += 1;
        RequestToken(self.last)
    }
}
