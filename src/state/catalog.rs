//! Ordered set of selectable timeouts with a cyclic cursor

use tracing::{debug, warn};

use super::Timeout;

/// Timeouts offered when neither the command line nor the settings file
/// supply a list.
pub const DEFAULT_TIMEOUTS: [Timeout; 7] = [
    Timeout::from_secs(30),
    Timeout::from_mins(5),
    Timeout::from_mins(10),
    Timeout::from_mins(15),
    Timeout::from_mins(30),
    Timeout::from_mins(60),
    Timeout::Indefinite,
];

/// An ordered, de-duplicated, never-empty list of timeouts plus the
/// current selection.
///
/// The order defines the cycle used by [`next`](Self::next) and
/// [`previous`](Self::previous). The selection starts at the first entry
/// and returns there on [`reset_selection`](Self::reset_selection); an
/// explicitly requested timeout may sit outside the list, in which case
/// the cycle continues as if from the first entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutCatalog {
    entries: Vec<Timeout>,
    selected: Timeout,
}

impl TimeoutCatalog {
    /// Build a catalog keeping the first occurrence of each timeout.
    ///
    /// An empty list yields the single entry `Indefinite`.
    pub fn new(timeouts: impl IntoIterator<Item = Timeout>) -> Self {
        let mut entries: Vec<Timeout> = Vec::new();
        for timeout in timeouts {
            if !entries.contains(&timeout) {
                entries.push(timeout);
            }
        }

        if entries.is_empty() {
            warn!("Empty timeout catalog, falling back to a single indefinite entry");
            entries.push(Timeout::Indefinite);
        }

        let selected = entries[0];
        Self { entries, selected }
    }

    pub fn entries(&self) -> &[Timeout] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: construction guarantees at least one entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_single(&self) -> bool {
        self.entries.len() == 1
    }

    pub fn contains(&self, timeout: Timeout) -> bool {
        self.entries.contains(&timeout)
    }

    pub fn first(&self) -> Timeout {
        self.entries[0]
    }

    pub fn last(&self) -> Timeout {
        self.entries[self.entries.len() - 1]
    }

    /// Cyclic successor; unknown values are treated as `first()`.
    pub fn next(&self, current: Timeout) -> Timeout {
        let idx = self.index_of(current);
        self.entries[(idx + 1) % self.entries.len()]
    }

    /// Cyclic predecessor; unknown values are treated as `first()`.
    pub fn previous(&self, current: Timeout) -> Timeout {
        let idx = self.index_of(current);
        let len = self.entries.len();
        self.entries[(idx + len - 1) % len]
    }

    /// Whether advancing from `current` wraps back to the first entry.
    pub fn wraps_after(&self, current: Timeout) -> bool {
        self.index_of(current) == self.entries.len() - 1
    }

    pub fn selection(&self) -> Timeout {
        self.selected
    }

    /// Point the selection at `timeout` and return it.
    pub fn select(&mut self, timeout: Timeout) -> Timeout {
        if !self.contains(timeout) {
            debug!(%timeout, "Selecting a timeout outside the catalog");
        }
        self.selected = timeout;
        self.selected
    }

    pub fn reset_selection(&mut self) {
        self.selected = self.first();
    }

    fn position(&self, timeout: Timeout) -> Option<usize> {
        self.entries.iter().position(|t| *t == timeout)
    }

    fn index_of(&self, timeout: Timeout) -> usize {
        self.position(timeout).unwrap_or(0)
    }
}

impl Default for TimeoutCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUTS)
    }
}
