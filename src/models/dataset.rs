//! Dataset snapshot model
//!
//! A snapshot is the complete view of one dataset at one page: its ordered
//! columns, the rows of the current page and the pagination state. Snapshots
//! are always replaced as a whole, never patched in place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::column::ColumnMeta;

/// A single cell value as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl CellValue {
    /// Render the value for tabular display
    pub fn display(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// A row keyed by column name
pub type Row = BTreeMap<String, CellValue>;

/// Pagination state of a snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    /// 1-based page number
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub total_items: u64,
}

impl PageInfo {
    /// Highest page that can be requested (at least 1, even for empty datasets)
    pub fn last_page(&self) -> u32 {
        self.total_pages.max(1)
    }

    /// Whether `page` is a valid page to request
    pub fn contains(&self, page: u32) -> bool {
        (1..=self.last_page()).contains(&page)
    }

    /// Clamp `page` into the valid range
    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.last_page())
    }
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            page_size: 20,
            total_items: 0,
        }
    }
}

/// Columns, the current page of rows and pagination of one dataset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetSnapshot {
    pub dataset_id: String,
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Row>,
    pub pagination: PageInfo,
}

impl DatasetSnapshot {
    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Build the snapshot for another page, keeping the known columns
    pub fn with_page(&self, rows: Vec<Row>, pagination: PageInfo) -> Self {
        Self {
            dataset_id: self.dataset_id.clone(),
            columns: self.columns.clone(),
            rows,
            pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds_for_empty_dataset() {
        let info = PageInfo::default();
        assert_eq!(info.last_page(), 1);
        assert!(info.contains(1));
        assert!(!info.contains(0));
        assert!(!info.contains(2));
    }

    #[test]
    fn test_clamp_page() {
        let info = PageInfo {
            current_page: 1,
            total_pages: 5,
            page_size: 20,
            total_items: 100,
        };
        assert_eq!(info.clamp_page(0), 1);
        assert_eq!(info.clamp_page(3), 3);
        assert_eq!(info.clamp_page(9), 5);
    }

    #[test]
    fn test_cell_value_untagged() {
        let row: Row = serde_json::from_str(r#"{"a": 1, "b": "x", "c": true, "d": null}"#).unwrap();
        assert_eq!(row["a"].display(), "1");
        assert_eq!(row["b"], CellValue::Text("x".to_string()));
        assert_eq!(row["c"], CellValue::Bool(true));
        assert_eq!(row["d"], CellValue::Null);
    }

    #[test]
    fn test_nested_cell_rejected() {
        let result = serde_json::from_str::<Row>(r#"{"a": [1, 2]}"#);
        assert!(result.is_err());
    }
}
