//! DNS data types shared by the resolver adapter and the record parsers.

use std::collections::BTreeMap;

use strum_macros::{Display, EnumIter};

/// Record types queried by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RecordType {
    Txt,
    Mx,
    Cname,
    A,
    Aaaa,
}

/// Raw record strings keyed by record type, in the order the resolver returned them.
///
/// TXT values have their character-strings concatenated, MX values look like
/// `"10 mx1.example.com."`, CNAME values are the target name and A/AAAA values
/// are addresses. A set is consumed by the parsers and then discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecordSet {
    records: BTreeMap<RecordType, Vec<String>>,
}

impl RawRecordSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding the answer to a single query.
    pub fn single(record_type: RecordType, values: Vec<String>) -> Self {
        let mut set = Self::new();
        set.insert(record_type, values);
        set
    }

    /// Appends values for a record type.
    pub fn insert(&mut self, record_type: RecordType, values: Vec<String>) {
        self.records.entry(record_type).or_default().extend(values);
    }

    /// Values of a record type; empty if the type was not queried or had no answers.
    pub fn get(&self, record_type: RecordType) -> &[String] {
        self.records
            .get(&record_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True if no type holds any value.
    pub fn is_empty(&self) -> bool {
        self.records.values().all(Vec::is_empty)
    }

    /// Merges another set into this one.
    pub fn merge(&mut self, other: RawRecordSet) {
        for (record_type, values) in other.records {
            self.insert(record_type, values);
        }
    }
}
