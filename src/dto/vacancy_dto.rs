use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::DEFAULT_PAGE_SIZE;
use crate::models::vacancy::JobType;

/// Paginated result envelope, as returned by every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Validate)]
pub struct FeedQuery {
    #[validate(range(min = 1))]
    pub page: u32,
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,
    pub job_type: Option<JobType>,
    pub company: Option<i64>,
    pub random: bool,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

impl FeedQuery {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            job_type: None,
            company: None,
            random: false,
        }
    }

    pub fn with_job_type(mut self, job_type: JobType) -> Self {
        self.job_type = Some(job_type);
        self
    }

    pub fn with_company(mut self, company: i64) -> Self {
        self.company = Some(company);
        self
    }

    pub fn shuffled(mut self) -> Self {
        self.random = true;
        self
    }

    /// Same filters, following page.
    pub fn next_page(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self.clone()
        }
    }

    /// Relative resource path, e.g. `jobs/?page=1&page_size=30`.
    pub fn path(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("page", &self.page.to_string());
        query.append_pair("page_size", &self.page_size.to_string());
        if let Some(company) = self.company {
            query.append_pair("company", &company.to_string());
        }
        if let Some(job_type) = self.job_type {
            query.append_pair("job_type", job_type.as_str());
        }
        if self.random {
            query.append_pair("ordering", "random");
        }
        format!("jobs/?{}", query.finish())
    }
}

pub fn apply_path(vacancy_id: i64) -> String {
    format!("jobs/{}/apply/", vacancy_id)
}

pub fn company_path(company_id: i64) -> String {
    format!("companies/{}/", company_id)
}
