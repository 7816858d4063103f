pub mod request;
pub mod response;
pub mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use serde::{Deserialize, Serialize};

use crate::{errors::RequestError, models::NoteStatus};

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct NoteQueryParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "get_default_page")]
    pub page: u32,
    #[serde(default = "get_default_limit")]
    pub limit: u32,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct StatisticsQueryParams {
    #[serde(default, rename = "startTime")]
    pub start_time: Option<String>,
    #[serde(default, rename = "endTime")]
    pub end_time: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct ReportQueryParams {
    #[serde(default)]
    pub status: Option<String>,
}

fn get_default_page() -> u32 {
    1
}

fn get_default_limit() -> u32 {
    10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    NewestFirst,
    OldestFirst,
}

/// Validated listing filter.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteFilter {
    pub statuses: Vec<NoteStatus>,
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
    pub order: SortOrder,
}

impl NoteFilter {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

impl NoteQueryParams {
    /// `default_status` applies when the client sends no status; `all`
    /// expands to every status except `deleted`, which is never listed.
    pub fn into_filter(
        self,
        default_status: &str,
        order: SortOrder,
    ) -> Result<NoteFilter, RequestError> {
        let status = self
            .status
            .map(|status| status.trim().to_lowercase())
            .filter(|status| !status.is_empty())
            .unwrap_or_else(|| default_status.to_string());
        let statuses = if status == "all" {
            NoteStatus::VISIBLE.to_vec()
        } else {
            match status.parse::<NoteStatus>()? {
                NoteStatus::Deleted => return Err(RequestError::BadRequest("Invalid status")),
                status => vec![status],
            }
        };
        if self.page == 0 {
            return Err(RequestError::BadRequest("page must be at least 1"));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_SIZE {
            return Err(RequestError::BadRequest("limit must be between 1 and 100"));
        }
        let search = self
            .search
            .map(|search| search.trim().to_string())
            .filter(|search| !search.is_empty());
        Ok(NoteFilter {
            statuses,
            search,
            page: self.page,
            limit: self.limit,
            order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(status: Option<&str>, page: u32, limit: u32) -> NoteQueryParams {
        NoteQueryParams {
            search: None,
            status: status.map(str::to_string),
            page,
            limit,
        }
    }

    #[test]
    fn all_expands_to_every_live_status() {
        let filter = params(Some("all"), 1, 10)
            .into_filter("all", SortOrder::NewestFirst)
            .unwrap();
        assert_eq!(filter.statuses, NoteStatus::VISIBLE.to_vec());
    }

    #[test]
    fn missing_status_uses_the_default() {
        let filter = params(None, 1, 10)
            .into_filter("pending", SortOrder::OldestFirst)
            .unwrap();
        assert_eq!(filter.statuses, vec![NoteStatus::Pending]);
    }

    #[test]
    fn deleted_and_unknown_statuses_are_rejected() {
        assert!(params(Some("deleted"), 1, 10)
            .into_filter("all", SortOrder::NewestFirst)
            .is_err());
        assert!(params(Some("published"), 1, 10)
            .into_filter("all", SortOrder::NewestFirst)
            .is_err());
    }

    #[test]
    fn pagination_bounds_are_enforced() {
        assert!(params(None, 0, 10)
            .into_filter("all", SortOrder::NewestFirst)
            .is_err());
        assert!(params(None, 1, 101)
            .into_filter("all", SortOrder::NewestFirst)
            .is_err());
        let filter = params(None, 3, 20)
            .into_filter("all", SortOrder::NewestFirst)
            .unwrap();
        assert_eq!(filter.offset(), 40);
    }

    #[test]
    fn blank_search_is_ignored() {
        let mut query = params(None, 1, 10);
        query.search = Some("   ".to_string());
        let filter = query.into_filter("all", SortOrder::NewestFirst).unwrap();
        assert_eq!(filter.search, None);
    }
}
