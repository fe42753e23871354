use rust_decimal::Decimal;

use super::common::*;
use crate::board::domain::{JobDetails, JobId, JobUpdate};
use crate::board::error::{BoardError, ErrorKind};

#[test]
fn create_lists_the_posting_with_owner_contact() {
    let fixture = fixture();
    let owner = provider(fixture.store.as_ref(), "hiring@acme.test");

    let view = fixture
        .jobs
        .create(owner, details("Backend Engineer"))
        .expect("job created");

    assert!(view.is_active);
    assert_eq!(view.created_by_id, owner.id);
    assert_eq!(view.created_by_email.as_deref(), Some("hiring@acme.test"));
    assert_eq!(fixture.jobs.get(view.id).expect("public lookup"), view);
}

#[test]
fn create_validates_posting_fields() {
    let fixture = fixture();
    let owner = provider(fixture.store.as_ref(), "hiring@acme.test");

    let cases = [
        JobDetails {
            title: "   ".to_string(),
            ..details("Backend Engineer")
        },
        JobDetails {
            title: "t".repeat(101),
            ..details("Backend Engineer")
        },
        JobDetails {
            description: String::new(),
            ..details("Backend Engineer")
        },
        JobDetails {
            company: Some("c".repeat(101)),
            ..details("Backend Engineer")
        },
        JobDetails {
            job_type: Some("j".repeat(51)),
            ..details("Backend Engineer")
        },
        JobDetails {
            salary: Some(Decimal::ZERO),
            ..details("Backend Engineer")
        },
        JobDetails {
            salary: Some(Decimal::new(-1, 0)),
            ..details("Backend Engineer")
        },
    ];

    for draft in cases {
        let err = fixture
            .jobs
            .create(owner, draft.clone())
            .expect_err("invalid draft rejected");
        assert_eq!(err.kind(), ErrorKind::Invalid, "{draft:?}");
    }
    assert!(fixture.jobs.active().expect("listing").is_empty());
}

#[test]
fn update_and_delete_require_the_owner() {
    let fixture = fixture();
    let owner = provider(fixture.store.as_ref(), "hiring@acme.test");
    let rival = provider(fixture.store.as_ref(), "hiring@rival.test");
    let job = post_job(&fixture, owner, "Backend Engineer");

    let update = JobUpdate {
        details: details("Staff Engineer"),
        is_active: None,
    };
    assert!(matches!(
        fixture.jobs.update(rival, job, update.clone()),
        Err(BoardError::NotJobOwner)
    ));
    assert!(matches!(
        fixture.jobs.delete(rival, job),
        Err(BoardError::NotJobOwner)
    ));
    assert!(matches!(
        fixture.jobs.delete(owner, JobId(404)),
        Err(BoardError::JobNotFound)
    ));

    let updated = fixture
        .jobs
        .update(owner, job, update)
        .expect("owner update");
    assert_eq!(updated.title, "Staff Engineer");
    assert!(updated.is_active);
    assert!(updated.updated_at.is_some());
}

#[test]
fn soft_delete_hides_from_public_but_not_from_owner() {
    let fixture = fixture();
    let owner = provider(fixture.store.as_ref(), "hiring@acme.test");
    let kept = post_job(&fixture, owner, "Backend Engineer");
    let removed = post_job(&fixture, owner, "Data Engineer");

    fixture.jobs.delete(owner, removed).expect("soft delete");

    match fixture.jobs.get(removed) {
        Err(err @ BoardError::JobInactive) => assert_eq!(err.kind(), ErrorKind::Conflict),
        other => panic!("expected inactive job, got {other:?}"),
    }
    let public: Vec<JobId> = fixture
        .jobs
        .active()
        .expect("listing")
        .into_iter()
        .map(|job| job.id)
        .collect();
    assert_eq!(public, vec![kept]);

    let owned: Vec<JobId> = fixture
        .jobs
        .my_jobs(owner)
        .expect("owner listing")
        .into_iter()
        .map(|job| job.id)
        .collect();
    assert_eq!(owned, vec![removed, kept]);
    assert_eq!(fixture.jobs.my_jobs_count(owner).expect("count"), 1);
}

#[test]
fn public_filters_only_return_active_matches() {
    let fixture = fixture();
    let owner = provider(fixture.store.as_ref(), "hiring@acme.test");

    let remote = fixture
        .jobs
        .create(
            owner,
            JobDetails {
                location: Some("Remote".to_string()),
                job_type: Some("CONTRACT".to_string()),
                experience_level: Some("JUNIOR".to_string()),
                ..details("Frontend Developer")
            },
        )
        .expect("created")
        .id;
    let berlin = post_job(&fixture, owner, "Rust Backend Engineer");
    let closed = post_job(&fixture, owner, "Rust Platform Engineer");
    fixture.jobs.delete(owner, closed).expect("soft delete");

    let ids = |views: Vec<crate::board::JobView>| -> Vec<JobId> {
        views.into_iter().map(|view| view.id).collect()
    };

    assert_eq!(ids(fixture.jobs.search("rust").expect("search")), vec![berlin]);
    assert_eq!(
        ids(fixture.jobs.search("ACME").expect("search")),
        vec![berlin, remote]
    );
    assert_eq!(
        ids(fixture.jobs.by_location("berlin").expect("location")),
        vec![berlin]
    );
    assert_eq!(
        ids(fixture.jobs.by_type("CONTRACT").expect("type")),
        vec![remote]
    );
    assert!(fixture.jobs.by_type("contract").expect("type").is_empty());
    assert_eq!(
        ids(fixture.jobs.by_experience("SENIOR").expect("experience")),
        vec![berlin]
    );
}
