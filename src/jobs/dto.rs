use serde::Deserialize;

use crate::json::nullable;

/// Body of `POST /jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub user_id: Option<i64>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub salary: Option<String>,
}

/// Body of `PUT /jobs/{id}`; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub user_id: Option<i64>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub salary: Option<Option<String>>,
}
