use serde::{Deserialize, Serialize};

/// Default number of rows per page in list screens.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Page<T> {
    #[serde(alias = "items", alias = "records", default = "Vec::new")]
    pub list: Vec<T>,
    #[serde(default)]
    pub total: i64,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Number of pages needed for `total` rows at `page_size`.
    pub fn page_count(&self, page_size: u32) -> i64 {
        if page_size == 0 || self.total <= 0 {
            return 0;
        }
        let size = i64::from(page_size);
        (self.total + size - 1) / size
    }
}

/// Paged, fuzzy-filtered list query shared by the IAM list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct ListQuery {
    pub keyword: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_accepts_aliases() {
        let page: Page<i32> = serde_json::from_str(r#"{"items": [1, 2], "total": 12}"#)
            .expect("aliased page should parse");
        assert_eq!(page.list, vec![1, 2]);
        assert_eq!(page.page_count(10), 2);

        let page: Page<i32> = serde_json::from_str(r#"{"total": 0}"#).expect("empty page should parse");
        assert!(page.is_empty());
        assert_eq!(page.page_count(10), 0);
    }

    #[test]
    fn test_list_query_serializes_camel_case() {
        let value = serde_json::to_value(ListQuery::default().keyword("ops")).unwrap();
        assert_eq!(value, serde_json::json!({"keyword": "ops", "page": 1, "pageSize": 10}));
    }
}
