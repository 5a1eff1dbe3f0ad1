/// Errors raised by realtime transports.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RealtimeError {
    /// Failed to open the event stream.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server refused or failed a topic registration.
    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    /// No connection handshake arrived in time.
    #[error("Timed out waiting for realtime connection")]
    Timeout,

    /// The transport was shut down.
    #[error("Realtime transport closed")]
    Closed,
}
