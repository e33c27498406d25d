//! Venue configuration.

/// Tunables for the gateway and the per-instrument workers.
#[derive(Debug, Clone)]
pub struct VenueConfig {
    /// Command queue depth per instrument worker.
    pub queue_capacity: usize,
    /// Number of recent client idempotency keys remembered for dedup.
    pub dedup_window: usize,
    /// Capacity of the trade broadcast channel.
    pub broadcast_capacity: usize,
    /// Reject orders exceeding cash/position net of open commitments.
    pub risk_checks: bool,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1_024,
            dedup_window: 4_096,
            broadcast_capacity: 1_024,
            risk_checks: true,
        }
    }
}
