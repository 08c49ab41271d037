//! Append-only record of what a searcher did on its last run.
//!
//! Searchers push one or more entries per iteration; reporters drain the log
//! afterwards in insertion order. The "version" of an entry is the iteration
//! number it was produced at, and the log tracks the highest version seen so
//! a consumer knows how many iterations a run took without replaying it.

use ndarray::Array1;

/// One recorded event of an iterative search.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEntry {
    /// A point the searcher evaluated at.
    Point { version: usize, coords: Array1<f64> },
    /// A scalar produced while iterating, e.g. a line-search step scale.
    Value { version: usize, value: f64 },
    /// A free-text annotation.
    Comment { version: usize, text: String },
}

impl TraceEntry {
    /// The iteration number this entry was produced at.
    pub fn version(&self) -> usize {
        match self {
            TraceEntry::Point { version, .. }
            | TraceEntry::Value { version, .. }
            | TraceEntry::Comment { version, .. } => *version,
        }
    }
}

/// An ordered, append-only sequence of version-stamped entries.
///
/// Entries are only ever removed wholesale by [`clear`](TraceLog::clear),
/// which a searcher calls at the start of every run.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    entries: Vec<TraceEntry>,
    max_version: usize,
}

impl TraceLog {
    pub fn new() -> TraceLog {
        TraceLog::default()
    }

    pub fn append(&mut self, entry: TraceEntry) {
        self.max_version = self.max_version.max(entry.version());
        self.entries.push(entry);
    }

    /// Bulk append, preserving the order of `entries`.
    pub fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = TraceEntry>,
    {
        for entry in entries {
            self.append(entry);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.max_version = 0;
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<TraceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The highest iteration number stamped on any entry, 0 when empty.
    pub fn max_version(&self) -> usize {
        self.max_version
    }
}

impl<'a> IntoIterator for &'a TraceLog {
    type Item = &'a TraceEntry;
    type IntoIter = std::slice::Iter<'a, TraceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn keeps_insertion_order() {
        let mut log = TraceLog::new();
        log.append(TraceEntry::Comment { version: 0, text: "x:".to_owned() });
        log.append(TraceEntry::Point { version: 0, coords: array![1., 2.] });
        log.append(TraceEntry::Value { version: 1, value: 0.5 });

        let kinds: Vec<_> = log
            .iter()
            .map(|e| match e {
                TraceEntry::Comment { .. } => "comment",
                TraceEntry::Point { .. } => "point",
                TraceEntry::Value { .. } => "value",
            })
            .collect();
        assert_eq!(kinds, vec!["comment", "point", "value"]);
    }

    #[test]
    fn max_version_tracks_appends() {
        let mut log = TraceLog::new();
        assert_eq!(log.max_version(), 0);
        for version in 0..5 {
            log.append(TraceEntry::Value { version, value: version as f64 });
            assert_eq!(log.max_version(), version);
        }
        // A lower version never decreases the maximum.
        log.append(TraceEntry::Value { version: 2, value: 0. });
        assert_eq!(log.max_version(), 4);
    }

    #[test]
    fn extend_preserves_order_and_versions() {
        let mut log = TraceLog::new();
        log.extend((0..3).map(|version| TraceEntry::Value { version, value: 0. }));
        assert_eq!(log.len(), 3);
        assert_eq!(log.max_version(), 2);
        let versions: Vec<_> = log.iter().map(TraceEntry::version).collect();
        assert_eq!(versions, vec![0, 1, 2]);
    }

    #[test]
    fn clear_resets_entries_and_version() {
        let mut log = TraceLog::new();
        log.append(TraceEntry::Point { version: 7, coords: array![0.] });
        assert!(!log.is_empty());

        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.iter().count(), 0);
        assert_eq!(log.max_version(), 0);
    }
}
