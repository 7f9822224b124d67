use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct PaginationParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PaginationParams {
    pub fn limit(&self) -> i64 {
        self.limit
            .as_ref()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(100)
    }
    pub fn offset(&self) -> i64 {
        self.offset
            .as_ref()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(0)
    }
}

#[derive(Deserialize, Debug)]
pub struct SearchParams<T> {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    pub sort: Option<T>,
    pub sort_by: Option<SortDirection>,
    pub q: Option<String>,
}

impl<T> Default for SearchParams<T> {
    fn default() -> Self {
        Self {
            pagination: PaginationParams::default(),
            sort: None,
            sort_by: None,
            q: None,
        }
    }
}

impl<T> SearchParams<T> {
    pub fn limit(&self) -> i64 {
        self.pagination.limit()
    }
    pub fn offset(&self) -> i64 {
        self.pagination.offset()
    }
    pub fn sort(&self) -> Option<&T> {
        self.sort.as_ref()
    }
    pub fn sort_by(&self) -> SortDirection {
        self.sort_by.unwrap_or(SortDirection::Desc)
    }
    /// The search term, with empty and whitespace-only input treated the
    /// same as an absent parameter.
    pub fn query(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn pagination_ignores_garbage() {
        let params = PaginationParams {
            limit: Some("ten".to_string()),
            offset: Some("7".to_string()),
        };
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 7);
    }

    #[test]
    fn blank_query_is_absent() {
        let params: SearchParams<SortDirection> = SearchParams {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.query(), None);

        let params: SearchParams<SortDirection> = SearchParams {
            q: Some(" python ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.query(), Some("python"));
    }
}
