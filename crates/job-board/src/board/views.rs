use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationId, ApplicationStatus, Job, JobId, User, UserId};
use crate::identity::Role;

/// Public representation of a posting with its owner's contact details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<Decimal>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_by_id: UserId,
    pub created_by_name: Option<String>,
    pub created_by_email: Option<String>,
}

impl JobView {
    pub fn new(job: Job, owner: Option<&User>) -> Self {
        let Job {
            id,
            owner: owner_id,
            details,
            is_active,
            created_at,
            updated_at,
        } = job;

        Self {
            id,
            title: details.title,
            description: details.description,
            company: details.company,
            location: details.location,
            salary: details.salary,
            job_type: details.job_type,
            experience_level: details.experience_level,
            created_at,
            updated_at,
            is_active,
            created_by_id: owner_id,
            created_by_name: owner.map(User::full_name),
            created_by_email: owner.map(|user| user.email.clone()),
        }
    }
}

/// Application joined with the job it targets and the applicant's contact details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub applicant_id: UserId,
    pub applicant_name: Option<String>,
    pub applicant_email: Option<String>,
}

impl ApplicationView {
    pub fn new(application: Application, job: Option<&Job>, applicant: Option<&User>) -> Self {
        Self {
            id: application.id,
            job_id: application.job,
            job_title: job.map(|job| job.details.title.clone()),
            company: job.and_then(|job| job.details.company.clone()),
            location: job.and_then(|job| job.details.location.clone()),
            status: application.status,
            applied_at: application.applied_at,
            updated_at: application.updated_at,
            cover_letter: application.cover_letter,
            resume_url: application.resume_url,
            applicant_id: application.applicant,
            applicant_name: applicant.map(User::full_name),
            applicant_email: applicant.map(|user| user.email.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Dashboard summary for either role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_applications: u64,
    /// Keyed by lower-case status label, one entry per status.
    pub applications_by_status: BTreeMap<String, u64>,
    pub recent_applications: Vec<ApplicationView>,
}
