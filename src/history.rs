use std::cmp::Reverse;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::MedicalRecord;

/// Records sharing one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryGroup<T> {
    pub date: NaiveDate,
    pub records: Vec<T>,
}

/// Group records into date buckets, newest date first. Inside a bucket
/// records stay newest first by time; equal timestamps keep input order.
pub fn group_by_date<T: MedicalRecord>(mut records: Vec<T>) -> Vec<HistoryGroup<T>> {
    records.sort_by_key(|r| Reverse(r.occurred_at()));

    let mut groups: Vec<HistoryGroup<T>> = Vec::new();
    for record in records {
        match groups.last_mut() {
            Some(group) if group.date == record.date() => group.records.push(record),
            _ => groups.push(HistoryGroup {
                date: record.date(),
                records: vec![record],
            }),
        }
    }
    groups
}
