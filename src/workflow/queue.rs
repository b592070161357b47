//! In-memory ordering and paging of queue listings.
//!
//! The backend returns every item for a status at once; sorting and paging
//! happen here.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use super::model::{Approval, RecordId, Requisition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Anything that can sit in a queue
pub trait QueueItem {
    fn id(&self) -> &RecordId;
    fn created_at(&self) -> Option<&Value>;

    fn sort_value(&self, key: SortKey) -> i64 {
        match key {
            SortKey::CreatedAt => self.created_at().map(timestamp_millis).unwrap_or(0),
            SortKey::Id => self.id().numeric(),
        }
    }
}

impl QueueItem for Requisition {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> Option<&Value> {
        self.created_at.as_ref()
    }
}

impl QueueItem for Approval {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> Option<&Value> {
        self.created_at.as_ref()
    }
}

/// Milliseconds since the epoch, or 0 for anything unreadable.
///
/// Accepts RFC 3339 strings, naive `YYYY-MM-DDTHH:MM:SS[.f]`, plain dates,
/// epoch-millisecond numbers and `[y, m, d, h, min, s]` arrays.
pub fn timestamp_millis(value: &Value) -> i64 {
    match value {
        Value::String(s) => parse_timestamp(s).unwrap_or(0),
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::Array(parts) => {
            let part = |i: usize| parts.get(i).and_then(Value::as_i64).unwrap_or(0);
            NaiveDate::from_ymd_opt(part(0) as i32, part(1).max(1) as u32, part(2).max(1) as u32)
                .and_then(|d| d.and_hms_opt(part(3) as u32, part(4) as u32, part(5) as u32))
                .map(|dt| dt.and_utc().timestamp_millis())
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Stable sort; items with equal keys keep their relative order
pub fn sort_items<T: QueueItem>(items: &mut [T], key: SortKey, order: SortOrder) {
    match order {
        SortOrder::Asc => items.sort_by_key(|item| item.sort_value(key)),
        SortOrder::Desc => items.sort_by(|a, b| b.sort_value(key).cmp(&a.sort_value(key))),
    }
}

#[derive(Debug, Serialize)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based
    pub page: usize,
    pub size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

pub fn total_pages(count: usize, size: usize) -> usize {
    let size = size.max(1);
    count.div_ceil(size).max(1)
}

/// Slice `items[(page-1)*size .. page*size]`, clamped to the list.
/// Page numbers below 1 are treated as 1.
pub fn paginate<T>(items: &[T], page: usize, size: usize) -> Page<'_, T> {
    let size = size.max(1);
    let page = page.max(1);
    let start = (page - 1).saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    Page {
        items: &items[start..end],
        page,
        size,
        total_pages: total_pages(items.len(), size),
        total_items: items.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn req(id: i64, created: Value) -> Requisition {
        serde_json::from_value(json!({"id": id, "createdAt": created})).unwrap()
    }

    fn ids(items: &[Requisition]) -> Vec<&str> {
        items.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn sorts_by_created_at_descending() {
        let mut items = vec![
            req(1, json!("2024-01-01T00:00:00Z")),
            req(2, json!("2024-03-01T00:00:00Z")),
            req(3, json!("2024-02-01")),
        ];
        sort_items(&mut items, SortKey::CreatedAt, SortOrder::Desc);
        assert_eq!(ids(&items), vec!["2", "3", "1"]);
    }

    #[test]
    fn unreadable_timestamps_sort_as_zero_and_stay_stable() {
        let mut items = vec![
            req(1, json!("garbage")),
            req(2, json!("2024-03-01T00:00:00Z")),
            req(3, Value::Null),
            req(4, json!("also garbage")),
        ];
        sort_items(&mut items, SortKey::CreatedAt, SortOrder::Asc);
        assert_eq!(ids(&items), vec!["1", "3", "4", "2"]);
    }

    #[test]
    fn desc_then_asc_restores_order() {
        let mut items = vec![
            req(1, json!("2024-01-01T00:00:00Z")),
            req(2, json!("2024-01-01T00:00:00Z")),
            req(3, json!("2024-02-01T00:00:00Z")),
            req(4, json!([2024, 1, 15, 8, 0, 0])),
        ];
        sort_items(&mut items, SortKey::CreatedAt, SortOrder::Asc);
        let ascending = ids(&items).join(",");
        sort_items(&mut items, SortKey::CreatedAt, SortOrder::Desc);
        sort_items(&mut items, SortKey::CreatedAt, SortOrder::Asc);
        assert_eq!(ids(&items).join(","), ascending);
        assert_eq!(ascending, "1,2,4,3");
    }

    #[test]
    fn sorts_by_numeric_id() {
        let mut items = vec![req(10, Value::Null), req(9, Value::Null), req(100, Value::Null)];
        sort_items(&mut items, SortKey::Id, SortOrder::Asc);
        assert_eq!(ids(&items), vec!["9", "10", "100"]);
    }

    #[test]
    fn page_sizes_sum_to_total() {
        let items: Vec<u32> = (0..23).collect();
        let pages = total_pages(items.len(), 10);
        assert_eq!(pages, 3);
        let mut seen = 0;
        for p in 1..=pages {
            let page = paginate(&items, p, 10);
            if p < pages {
                assert_eq!(page.items.len(), 10);
            }
            seen += page.items.len();
        }
        assert_eq!(seen, 23);
    }

    #[test]
    fn empty_list_has_one_page() {
        let items: Vec<u32> = vec![];
        let page = paginate(&items, 1, 10);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let items: Vec<u32> = (0..5).collect();
        assert!(paginate(&items, 4, 2).items.is_empty());
        assert_eq!(paginate(&items, 0, 2).items, &[0, 1]);
    }
}
