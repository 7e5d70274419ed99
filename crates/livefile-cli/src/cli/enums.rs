use clap::ValueEnum;

/// Behavior when a client's outbox is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Overflow {
    /// Discard the oldest queued update
    DropOldest,
    /// Discard the incoming update
    DropNewest,
    /// Close the slow client
    Disconnect,
}
