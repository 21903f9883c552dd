//! OpenSearch query builders.
//!
//! This module turns a [`JobSearchRequest`] into an OpenSearch search body.

use serde_json::{json, Value};

use job_index_shared::{Industry, JobSearchRequest, SortOrder};

/// Fields matched by free-text queries; the title carries twice the weight.
pub const TEXT_QUERY_FIELDS: [&str; 4] = ["title^2", "company", "location", "industry.text"];

/// Build an OpenSearch search body from a JobSearchRequest.
///
/// The body contains:
/// - A `bool` query whose `must` clause is a `multi_match` over
///   [`TEXT_QUERY_FIELDS`] or `match_all` when there is no query text
/// - A `term` filter on `industry` when an industry is requested
/// - A salary sort when requested; relevance ordering otherwise
/// - `from`/`size` for the requested page and `track_total_hits` so the
///   reported total is exact
pub fn build_search_query(request: &JobSearchRequest) -> Value {
    let must = match request.query_text() {
        Some(text) => build_text_query(text),
        None => json!({ "match_all": {} }),
    };

    let filter: Vec<Value> = request
        .industry
        .map(build_industry_filter)
        .into_iter()
        .collect();

    let mut body = json!({
        "query": {
            "bool": {
                "must": [must],
                "filter": filter
            }
        },
        "from": request.offset(),
        "size": request.limit(),
        "track_total_hits": true
    });

    if let Some(order) = request.sort_by_salary {
        body["sort"] = build_salary_sort(order);
    }

    body
}

/// Relevance-scored match of the query text across the text fields.
fn build_text_query(query_text: &str) -> Value {
    json!({
        "multi_match": {
            "query": query_text,
            "fields": TEXT_QUERY_FIELDS
        }
    })
}

/// Exact-value filter on the industry keyword.
fn build_industry_filter(industry: Industry) -> Value {
    json!({ "term": { "industry": industry.as_str() } })
}

fn build_salary_sort(order: SortOrder) -> Value {
    json!([{ "salary": { "order": order.as_str() } }])
}
