use std::sync::atomic::Ordering;

use chrono::{Duration, Utc};
use scholaris_core::TenantId;
use scholaris_domain::{
    AuditAction, ReviewRecommendation, ReviewStatus, RoleKind, RoleScope, SubmissionStatus,
};

use crate::test_support::TestWorld;
use crate::{
    ActionErrorKind, AssignReviewerRequest, CompleteReviewRequest, ListReviewAssignmentsRequest,
    ReviewService,
};

fn service(world: &TestWorld) -> ReviewService {
    ReviewService::new(
        world.envelope(),
        world.store.clone(),
        world.store.clone(),
        world.store.clone(),
    )
}

async fn submission_status(world: &TestWorld) -> Option<SubmissionStatus> {
    world
        .store
        .state
        .lock()
        .await
        .submissions
        .first()
        .map(|submission| submission.status)
}

#[tokio::test]
async fn assigning_a_reviewer_opens_the_review_round() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let submission = world
        .seed_submission(journal.journal_id, SubmissionStatus::Submitted)
        .await;
    let (reviewer_id, _) = world.add_user("reviewer").await;
    let editor = world
        .login_as("editor", RoleKind::Editor, RoleScope::Journal(journal.journal_id))
        .await;

    let outcome = service(&world)
        .assign_reviewer(
            Some(&editor),
            AssignReviewerRequest {
                submission_id: submission.submission_id,
                reviewer_id,
                due_at: Some(Utc::now() + Duration::days(21)),
            },
        )
        .await;

    let Some(review) = outcome.data else {
        panic!("assignment should succeed: {:?}", outcome.error);
    };
    assert_eq!(review.status, ReviewStatus::Pending);
    assert_eq!(
        submission_status(&world).await,
        Some(SubmissionStatus::UnderReview)
    );
    assert_eq!(world.audit_actions().await, vec![AuditAction::ReviewAssigned]);
}

#[tokio::test]
async fn duplicate_pending_review_conflicts() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let submission = world
        .seed_submission(journal.journal_id, SubmissionStatus::Submitted)
        .await;
    let (reviewer_id, _) = world.add_user("reviewer").await;
    let editor = world.super_admin().await;
    let service = service(&world);
    let request = AssignReviewerRequest {
        submission_id: submission.submission_id,
        reviewer_id,
        due_at: None,
    };

    let first = service.assign_reviewer(Some(&editor), request).await;
    let second = service.assign_reviewer(Some(&editor), request).await;

    assert!(first.success);
    assert_eq!(second.error_kind, Some(ActionErrorKind::Conflict));
    assert_eq!(world.store.state.lock().await.reviews.len(), 1);
}

#[tokio::test]
async fn past_due_date_is_rejected() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let submission = world
        .seed_submission(journal.journal_id, SubmissionStatus::Submitted)
        .await;
    let editor = world.super_admin().await;

    let outcome = service(&world)
        .assign_reviewer(
            Some(&editor),
            AssignReviewerRequest {
                submission_id: submission.submission_id,
                reviewer_id: scholaris_core::UserId::new(),
                due_at: Some(Utc::now() - Duration::days(1)),
            },
        )
        .await;

    assert_eq!(outcome.error.as_deref(), Some("Validation failed"));
    assert_eq!(world.actor_lookups(), 0);
}

#[tokio::test]
async fn reviewer_completes_own_review_and_closes_the_round() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let submission = world
        .seed_submission(journal.journal_id, SubmissionStatus::Submitted)
        .await;
    let (reviewer_id, reviewer) = world.add_user("reviewer").await;
    let root = world.super_admin().await;
    let service = service(&world);

    let assigned = service
        .assign_reviewer(
            Some(&root),
            AssignReviewerRequest {
                submission_id: submission.submission_id,
                reviewer_id,
                due_at: None,
            },
        )
        .await;
    let Some(review) = assigned.data else {
        panic!("assignment should succeed");
    };

    let completed = service
        .complete_review(
            Some(&reviewer),
            CompleteReviewRequest {
                review_id: review.review_id,
                recommendation: ReviewRecommendation::MinorRevisions,
                comments: Some("Tighten section 3.".to_owned()),
            },
        )
        .await;

    let Some(completed) = completed.data else {
        panic!("reviewer should complete their own review");
    };
    assert_eq!(completed.status, ReviewStatus::Completed);
    assert_eq!(
        completed.recommendation,
        Some(ReviewRecommendation::MinorRevisions)
    );
    assert_eq!(
        submission_status(&world).await,
        Some(SubmissionStatus::ReviewCompleted)
    );
}

#[tokio::test]
async fn completion_stands_when_the_submission_cannot_be_advanced() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let submission = world
        .seed_submission(journal.journal_id, SubmissionStatus::UnderReview)
        .await;
    let (reviewer_id, reviewer) = world.add_user("reviewer").await;
    let root = world.super_admin().await;
    let service = service(&world);
    let assigned = service
        .assign_reviewer(
            Some(&root),
            AssignReviewerRequest {
                submission_id: submission.submission_id,
                reviewer_id,
                due_at: None,
            },
        )
        .await;
    let Some(review) = assigned.data else {
        panic!("assignment should succeed: {:?}", assigned.error);
    };
    world.store.fail_submission_saves.store(true, Ordering::SeqCst);

    let completed = service
        .complete_review(
            Some(&reviewer),
            CompleteReviewRequest {
                review_id: review.review_id,
                recommendation: ReviewRecommendation::Accept,
                comments: None,
            },
        )
        .await;

    assert!(completed.success, "completion failed: {:?}", completed.error);
    assert_eq!(
        world.store.state.lock().await.reviews[0].status,
        ReviewStatus::Completed
    );
    assert_eq!(
        submission_status(&world).await,
        Some(SubmissionStatus::UnderReview)
    );
    assert_eq!(
        world.audit_actions().await,
        vec![AuditAction::ReviewAssigned, AuditAction::ReviewCompleted]
    );
}

#[tokio::test]
async fn round_stays_open_while_reviews_are_pending() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let submission = world
        .seed_submission(journal.journal_id, SubmissionStatus::Submitted)
        .await;
    let (first_id, first) = world.add_user("first").await;
    let (second_id, _) = world.add_user("second").await;
    let root = world.super_admin().await;
    let service = service(&world);

    let mut review_ids = Vec::new();
    for reviewer_id in [first_id, second_id] {
        let outcome = service
            .assign_reviewer(
                Some(&root),
                AssignReviewerRequest {
                    submission_id: submission.submission_id,
                    reviewer_id,
                    due_at: None,
                },
            )
            .await;
        review_ids.extend(outcome.data.map(|review| review.review_id));
    }

    let outcome = service
        .complete_review(
            Some(&first),
            CompleteReviewRequest {
                review_id: review_ids[0],
                recommendation: ReviewRecommendation::Accept,
                comments: None,
            },
        )
        .await;

    assert!(outcome.success);
    assert_eq!(
        submission_status(&world).await,
        Some(SubmissionStatus::UnderReview)
    );
}

#[tokio::test]
async fn other_users_cannot_complete_a_review() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let submission = world
        .seed_submission(journal.journal_id, SubmissionStatus::Submitted)
        .await;
    let (reviewer_id, _) = world.add_user("reviewer").await;
    let (_, stranger) = world.add_user("stranger").await;
    let root = world.super_admin().await;
    let service = service(&world);

    let assigned = service
        .assign_reviewer(
            Some(&root),
            AssignReviewerRequest {
                submission_id: submission.submission_id,
                reviewer_id,
                due_at: None,
            },
        )
        .await;
    let Some(review) = assigned.data else {
        panic!("assignment should succeed");
    };
    let writes_before = world.writes();

    let outcome = service
        .complete_review(
            Some(&stranger),
            CompleteReviewRequest {
                review_id: review.review_id,
                recommendation: ReviewRecommendation::Decline,
                comments: None,
            },
        )
        .await;

    assert_eq!(outcome.error.as_deref(), Some("Unauthorized"));
    assert_eq!(world.writes(), writes_before);
}

#[tokio::test]
async fn completed_review_cannot_be_completed_again() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let submission = world
        .seed_submission(journal.journal_id, SubmissionStatus::Submitted)
        .await;
    let (reviewer_id, reviewer) = world.add_user("reviewer").await;
    let root = world.super_admin().await;
    let service = service(&world);

    let Some(review) = service
        .assign_reviewer(
            Some(&root),
            AssignReviewerRequest {
                submission_id: submission.submission_id,
                reviewer_id,
                due_at: None,
            },
        )
        .await
        .data
    else {
        panic!("assignment should succeed");
    };
    let request = CompleteReviewRequest {
        review_id: review.review_id,
        recommendation: ReviewRecommendation::Accept,
        comments: None,
    };

    let first = service.complete_review(Some(&reviewer), request.clone()).await;
    let second = service.complete_review(Some(&reviewer), request).await;

    assert!(first.success);
    assert_eq!(second.error_kind, Some(ActionErrorKind::Conflict));
}

#[tokio::test]
async fn listing_requires_an_editorial_role() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let submission = world
        .seed_submission(journal.journal_id, SubmissionStatus::Submitted)
        .await;
    let author = world
        .login_as("author", RoleKind::Author, RoleScope::Journal(journal.journal_id))
        .await;
    let section = world
        .login_as(
            "section",
            RoleKind::SectionEditor,
            RoleScope::Journal(journal.journal_id),
        )
        .await;
    let service = service(&world);
    let request = ListReviewAssignmentsRequest {
        submission_id: submission.submission_id,
    };

    let denied = service
        .list_review_assignments(Some(&author), request)
        .await;
    let allowed = service
        .list_review_assignments(Some(&section), request)
        .await;

    assert_eq!(denied.error_kind, Some(ActionErrorKind::Forbidden));
    assert_eq!(allowed.data, Some(Vec::new()));
}
