use tracing::{info, warn};

use crate::{
    error::AppError,
    jobs::{
        dto::{CreateJobRequest, UpdateJobRequest},
        repo_types::{Job, JobChanges, JobType, NewJob},
    },
    state::AppState,
    validation::{escape_markup, FieldErrors, Rule, Validator},
};

const TITLE_RULES: &[Rule] = &[Rule::MaxLen(255)];
const DESCRIPTION_RULES: &[Rule] = &[Rule::MaxLen(65_535)];
const LOCATION_RULES: &[Rule] = &[Rule::MaxLen(255)];
const JOB_TYPE_RULES: &[Rule] = &[Rule::OneOf(JobType::NAMES)];
const SALARY_RULES: &[Rule] = &[Rule::MaxLen(255)];

fn with(base: Rule, rules: &[Rule]) -> Vec<Rule> {
    std::iter::once(base).chain(rules.iter().copied()).collect()
}

fn clean(text: &str) -> String {
    escape_markup(text.trim())
}

/// Blank salaries are stored as NULL.
fn clean_salary(salary: Option<&str>) -> Option<String> {
    salary.map(str::trim).filter(|s| !s.is_empty()).map(clean)
}

async fn check_owner(
    st: &AppState,
    v: &mut Validator,
    user_id: Option<i64>,
    required: bool,
) -> Result<(), AppError> {
    match user_id {
        None if required => {
            v.add("user_id", "The user id field is required.");
        }
        None => {}
        Some(id) => {
            if st.users.find_by_id(id).await?.is_none() {
                v.add("user_id", "The selected user id is invalid.");
            }
        }
    }
    Ok(())
}

/// All jobs in insertion order.
pub async fn list(st: &AppState) -> Result<Vec<Job>, AppError> {
    Ok(st.jobs.list().await?)
}

pub async fn get(st: &AppState, id: i64) -> Result<Job, AppError> {
    st.jobs.find_by_id(id).await?.ok_or(AppError::NotFound("Job"))
}

pub async fn create(st: &AppState, req: CreateJobRequest) -> Result<Job, AppError> {
    let mut v = Validator::new();
    v.check("title", req.title.as_deref(), &with(Rule::Required, TITLE_RULES))
        .check(
            "description",
            req.description.as_deref(),
            &with(Rule::Required, DESCRIPTION_RULES),
        )
        .check("location", req.location.as_deref(), &with(Rule::Required, LOCATION_RULES))
        .check("job_type", req.job_type.as_deref(), &with(Rule::Required, JOB_TYPE_RULES))
        .check("salary", req.salary.as_deref(), SALARY_RULES);
    check_owner(st, &mut v, req.user_id, true).await?;
    v.finish()?;

    let (Some(title), Some(description), Some(user_id), Some(location), Some(job_type)) = (
        req.title,
        req.description,
        req.user_id,
        req.location,
        req.job_type,
    ) else {
        return Err(AppError::Validation(FieldErrors::single(
            "body",
            "The given data was invalid.",
        )));
    };

    let job = st
        .jobs
        .create(NewJob {
            title: clean(&title),
            description: clean(&description),
            user_id,
            location: clean(&location),
            job_type: job_type.parse()?,
            salary: clean_salary(req.salary.as_deref()),
        })
        .await?;

    info!(job_id = job.id, user_id = job.user_id, "job created");
    Ok(job)
}

/// Apply only the fields present in `req`.
pub async fn update(st: &AppState, id: i64, req: UpdateJobRequest) -> Result<Job, AppError> {
    if st.jobs.find_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("Job"));
    }

    let mut v = Validator::new();
    v.check("title", req.title.as_deref(), &with(Rule::Filled, TITLE_RULES))
        .check(
            "description",
            req.description.as_deref(),
            &with(Rule::Filled, DESCRIPTION_RULES),
        )
        .check("location", req.location.as_deref(), &with(Rule::Filled, LOCATION_RULES))
        .check("job_type", req.job_type.as_deref(), &with(Rule::Filled, JOB_TYPE_RULES))
        .check("salary", req.salary.as_ref().and_then(|s| s.as_deref()), SALARY_RULES);
    check_owner(st, &mut v, req.user_id, false).await?;
    v.finish()?;

    let changes = JobChanges {
        title: req.title.as_deref().map(clean),
        description: req.description.as_deref().map(clean),
        user_id: req.user_id,
        location: req.location.as_deref().map(clean),
        job_type: req.job_type.as_deref().map(str::parse::<JobType>).transpose()?,
        salary: req.salary.map(|s| clean_salary(s.as_deref())),
    };

    let job = st
        .jobs
        .update(id, changes)
        .await?
        .ok_or(AppError::NotFound("Job"))?;
    info!(job_id = job.id, "job updated");
    Ok(job)
}

pub async fn delete(st: &AppState, id: i64) -> Result<(), AppError> {
    if !st.jobs.delete(id).await? {
        warn!(job_id = id, "delete of missing job");
        return Err(AppError::NotFound("Job"));
    }
    info!(job_id = id, "job deleted");
    Ok(())
}

/// Jobs owned by `user_id`; the user itself must exist.
pub async fn list_by_user(st: &AppState, user_id: i64) -> Result<Vec<Job>, AppError> {
    if st.users.find_by_id(user_id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }
    Ok(st.jobs.list_by_user(user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::hash_password,
        users::repo_types::{NewUser, User},
    };

    async fn seed_user(st: &AppState, username: &str) -> User {
        st.users
            .create(NewUser {
                name: "John".into(),
                surname: "Doe".into(),
                username: username.into(),
                email: format!("{username}@example.com"),
                password_hash: hash_password("password123").unwrap(),
            })
            .await
            .unwrap()
    }

    fn dev_job(user_id: i64) -> CreateJobRequest {
        CreateJobRequest {
            title: Some("Dev".into()),
            description: Some("Build the job board".into()),
            user_id: Some(user_id),
            location: Some("NY".into()),
            job_type: Some("full-time".into()),
            salary: Some("70000".into()),
        }
    }

    #[tokio::test]
    async fn every_allowed_job_type_is_accepted() {
        let st = AppState::fake();
        let owner = seed_user(&st, "owner").await;
        for name in JobType::NAMES {
            let req = CreateJobRequest {
                job_type: Some(name.to_string()),
                ..dev_job(owner.id)
            };
            let job = create(&st, req).await.unwrap();
            assert_eq!(job.job_type.as_str(), *name);
        }
    }

    #[tokio::test]
    async fn unknown_job_type_is_rejected() {
        let st = AppState::fake();
        let owner = seed_user(&st, "owner").await;
        for bad in ["internship", "Full-Time", ""] {
            let req = CreateJobRequest {
                job_type: Some(bad.into()),
                ..dev_job(owner.id)
            };
            let Err(AppError::Validation(errors)) = create(&st, req).await else {
                panic!("expected validation error for {bad:?}");
            };
            assert!(errors.contains("job_type"));
        }
        assert!(list(&st).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_requires_an_existing_owner() {
        let st = AppState::fake();
        let Err(AppError::Validation(errors)) = create(&st, dev_job(42)).await else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("user_id").unwrap(), ["The selected user id is invalid."]);

        let req = CreateJobRequest {
            user_id: None,
            title: None,
            ..dev_job(1)
        };
        let Err(AppError::Validation(errors)) = create(&st, req).await else {
            panic!("expected validation error");
        };
        assert!(errors.contains("user_id"));
        assert!(errors.contains("title"));
    }

    #[tokio::test]
    async fn create_escapes_markup() {
        let st = AppState::fake();
        let owner = seed_user(&st, "owner").await;
        let req = CreateJobRequest {
            description: Some("<script>alert(1)</script>".into()),
            ..dev_job(owner.id)
        };
        let job = create(&st, req).await.unwrap();
        assert_eq!(job.description, "&lt;script&gt;alert(1)&lt;/script&gt;");
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields_alone() {
        let st = AppState::fake();
        let owner = seed_user(&st, "owner").await;
        let job = create(&st, dev_job(owner.id)).await.unwrap();

        let req = UpdateJobRequest {
            salary: Some(Some("80000".into())),
            ..Default::default()
        };
        let updated = update(&st, job.id, req).await.unwrap();

        assert_eq!(updated.salary.as_deref(), Some("80000"));
        assert_eq!(updated.title, job.title);
        assert_eq!(updated.description, job.description);
        assert_eq!(updated.location, job.location);
        assert_eq!(updated.job_type, job.job_type);
        assert_eq!(updated.user_id, job.user_id);
    }

    #[tokio::test]
    async fn update_validates_present_fields_only() {
        let st = AppState::fake();
        let owner = seed_user(&st, "owner").await;
        let job = create(&st, dev_job(owner.id)).await.unwrap();

        let req = UpdateJobRequest {
            title: Some("   ".into()),
            job_type: Some("gig".into()),
            ..Default::default()
        };
        let Err(AppError::Validation(errors)) = update(&st, job.id, req).await else {
            panic!("expected validation error");
        };
        assert!(errors.contains("title"));
        assert!(errors.contains("job_type"));
        assert!(!errors.contains("description"));
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_job_are_not_found() {
        let st = AppState::fake();
        assert!(matches!(
            update(&st, 7, UpdateJobRequest::default()).await,
            Err(AppError::NotFound("Job"))
        ));
        assert!(matches!(delete(&st, 7).await, Err(AppError::NotFound("Job"))));
    }

    #[tokio::test]
    async fn delete_twice_is_not_found_the_second_time() {
        let st = AppState::fake();
        let owner = seed_user(&st, "owner").await;
        let job = create(&st, dev_job(owner.id)).await.unwrap();
        delete(&st, job.id).await.unwrap();
        assert!(matches!(delete(&st, job.id).await, Err(AppError::NotFound("Job"))));
        assert!(matches!(get(&st, job.id).await, Err(AppError::NotFound("Job"))));
    }

    #[tokio::test]
    async fn list_by_user_requires_the_user() {
        let st = AppState::fake();
        assert!(matches!(list_by_user(&st, 99).await, Err(AppError::NotFound("User"))));

        let owner = seed_user(&st, "owner").await;
        assert!(list_by_user(&st, owner.id).await.unwrap().is_empty());
        create(&st, dev_job(owner.id)).await.unwrap();
        assert_eq!(list_by_user(&st, owner.id).await.unwrap().len(), 1);
    }
}
