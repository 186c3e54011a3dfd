//! Per-category index of the dates that have a snapshot on disk

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used for index entries and snapshot `date` fields
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Contents of an `index.json` file
///
/// `available_dates` holds zero-padded `YYYY-MM-DD` strings, so lexicographic
/// order is chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateIndex {
    pub available_dates: Vec<String>,
}

impl DateIndex {
    /// Insert `date` if it is not already listed, keeping the list sorted and
    /// free of duplicates. Returns `true` when the date was newly added.
    pub fn insert(&mut self, date: NaiveDate) -> bool {
        let key = date.format(DATE_FORMAT).to_string();
        let added = !self.available_dates.contains(&key);
        if added {
            self.available_dates.push(key);
        }
        // Files edited by hand may arrive unsorted or with repeats.
        self.available_dates.sort();
        self.available_dates.dedup();
        added
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let key = date.format(DATE_FORMAT).to_string();
        self.available_dates.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.available_dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.available_dates.is_empty()
    }
}
