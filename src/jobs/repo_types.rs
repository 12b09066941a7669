use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "job_type", rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Freelance,
    Temporary,
}

impl JobType {
    pub const NAMES: &'static [&'static str] =
        &["full-time", "part-time", "contract", "freelance", "temporary"];

    pub fn as_str(self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Contract => "contract",
            JobType::Freelance => "freelance",
            JobType::Temporary => "temporary",
        }
    }
}

impl std::str::FromStr for JobType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full-time" => Ok(JobType::FullTime),
            "part-time" => Ok(JobType::PartTime),
            "contract" => Ok(JobType::Contract),
            "freelance" => Ok(JobType::Freelance),
            "temporary" => Ok(JobType::Temporary),
            other => anyhow::bail!("unknown job type: {other}"),
        }
    }
}

/// Job posting row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub user_id: i64,
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub user_id: i64,
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<String>,
}

/// Partial update. `salary: Some(None)` clears the column.
#[derive(Debug, Clone, Default)]
pub struct JobChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub user_id: Option<i64>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub salary: Option<Option<String>>,
}
