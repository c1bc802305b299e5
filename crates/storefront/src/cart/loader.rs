//! Busy flag for the cart subsystem.

/// Tracks outstanding cart calls.
///
/// The flag is a count rather than a boolean so that when two calls overlap,
/// the first one finishing does not clear the flag while the second is still
/// pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderState {
    in_flight: usize,
}

impl LoaderState {
    /// Record a call starting.
    pub const fn show(&mut self) {
        self.in_flight += 1;
    }

    /// Record a call finishing.
    pub const fn hide(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_calls() {
        let mut loader = LoaderState::default();
        assert!(!loader.is_loading());

        loader.show();
        loader.show();
        loader.hide();
        assert!(loader.is_loading());

        loader.hide();
        assert!(!loader.is_loading());
    }

    #[test]
    fn test_hide_never_underflows() {
        let mut loader = LoaderState::default();
        loader.hide();
        assert_eq!(loader.in_flight(), 0);
        loader.show();
        assert!(loader.is_loading());
    }
}
