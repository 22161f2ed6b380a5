use std::cell::Cell;

/// Identifies one request issued through a [`LatestRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Keeps only the most recent of overlapping requests.
///
/// Each request takes a ticket when it starts. When it finishes, its result
/// is accepted only if no newer request started in the meantime.
#[derive(Debug, Default)]
pub struct LatestRequest {
    current: Cell<u64>,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        let next = self.current.get() + 1;
        self.current.set(next);
        Ticket(next)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.get() == ticket.0
    }

    /// `Some(value)` if the ticket is still the latest, else the value is
    /// discarded.
    pub fn accept<T>(&self, ticket: Ticket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            log::debug!(
                "discarding stale result (request {}, latest {})",
                ticket.0,
                self.current.get()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_result_is_discarded_after_newer_request() {
        let latest = LatestRequest::new();
        let first = latest.begin();
        let second = latest.begin();

        assert_eq!(latest.accept(second, "new"), Some("new"));
        assert_eq!(latest.accept(first, "old"), None);
    }

    #[test]
    fn single_request_is_accepted() {
        let latest = LatestRequest::new();
        let ticket = latest.begin();
        assert!(latest.is_current(ticket));
        assert_eq!(latest.accept(ticket, 1), Some(1));
    }
}
