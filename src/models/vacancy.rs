use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Temporary,
    Volunteer,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full_time",
            JobType::PartTime => "part_time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
            JobType::Temporary => "temporary",
            JobType::Volunteer => "volunteer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancyImage {
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub tag: String,
    pub slug: String,
}

/// A job opening as held by the feed, after key normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vacancy {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company: i64,
    pub location: Option<String>,
    pub job_type: JobType,
    pub is_active: bool,
    #[serde(default)]
    pub images: Vec<VacancyImage>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Vacancy {
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(|image| image.image_url.as_str())
    }
}
