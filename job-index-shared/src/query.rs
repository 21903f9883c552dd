//! Logical search request and paginated response.

use serde::{Deserialize, Serialize};

use crate::{Industry, JobDocument};

/// Page size used when a request does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Direction for sorting by salary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// A filter, sort and page request against the job index.
///
/// `page` is 1-based. Values below 1 for `page` or `limit` are treated as 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSearchRequest {
    /// Free-text query; blank text matches every job.
    pub query: Option<String>,
    /// Exact industry filter.
    pub industry: Option<Industry>,
    /// Explicit salary ordering; relevance ordering when `None`.
    pub sort_by_salary: Option<SortOrder>,
    pub page: u32,
    pub limit: u32,
}

impl Default for JobSearchRequest {
    fn default() -> Self {
        Self {
            query: None,
            industry: None,
            sort_by_salary: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl JobSearchRequest {
    /// Match-all request for the first page.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_industry(mut self, industry: Industry) -> Self {
        self.industry = Some(industry);
        self
    }

    pub fn sorted_by_salary(mut self, order: SortOrder) -> Self {
        self.sort_by_salary = Some(order);
        self
    }

    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    /// The query text, if it is present and not blank.
    pub fn query_text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.max(1)
    }

    /// Number of ranked results skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPage {
    pub data: Vec<JobDocument>,
    /// Total number of matching documents, not the page length.
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    /// Hits on this page that could not be mapped back to a job. They count
    /// toward `total` but are absent from `data`.
    #[serde(default)]
    pub skipped: u32,
}

impl JobPage {
    /// An empty page for the given request.
    pub fn empty(request: &JobSearchRequest) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page: request.page(),
            limit: request.limit(),
            skipped: 0,
        }
    }
}
