//! Tests for the rotation reminder run coordinator.

use std::sync::Arc;
use std::time::Duration;

use mockable::MockClock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockIdentityDirectory, MockMailSender};
use crate::domain::{Credential, MetadataTag, REMINDER_SUBJECT, StalenessThreshold};
use crate::test_support::rotation_reminder::{
    InMemoryIdentityDirectory, MutableClock, RecordingMailSender, aged_credential,
    reference_instant, tag,
};

const SENDER: &str = "keys@example.com";

#[fixture]
fn settings() -> RotationReminderSettings {
    RotationReminderSettings {
        threshold: StalenessThreshold::from_days(90),
        sender: SENDER.to_owned(),
        call_timeout: Duration::from_secs(5),
    }
}

fn job(
    directory: Arc<InMemoryIdentityDirectory>,
    mailer: Arc<RecordingMailSender>,
    settings: RotationReminderSettings,
) -> RotationReminderJob {
    RotationReminderJob::new(
        RotationReminderPorts::new(directory, mailer),
        Arc::new(MutableClock::new(reference_instant())),
        settings,
    )
}

fn stale(id: &str, user: &str, age_days: i64) -> Credential {
    aged_credential(id, user, reference_instant(), age_days)
}

fn email(address: &str) -> MetadataTag {
    tag("email", address)
}

fn address(raw: &str) -> RecipientAddress {
    RecipientAddress::parse(raw).expect("valid address")
}

#[rstest]
#[tokio::test]
async fn stale_key_triggers_one_reminder(settings: RotationReminderSettings) {
    let directory = Arc::new(InMemoryIdentityDirectory::new().with_user(
        "alice",
        vec![stale("AKIAALICE", "alice", 91)],
        vec![email("alice@example.com")],
    ));
    let mailer = Arc::new(RecordingMailSender::new());

    let summary = job(directory, mailer.clone(), settings)
        .run()
        .await
        .expect("run succeeds");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let message = &sent[0];
    assert_eq!(message.sender, SENDER);
    assert_eq!(message.subject, REMINDER_SUBJECT);
    assert_eq!(message.recipients, vec![address("alice@example.com")]);
    assert!(
        message
            .body
            .contains("AWS access key id AKIAALICE belonging to user alice was created over 90 days ago.")
    );
    assert_eq!(
        summary.outcome_for("alice"),
        Some(&IdentityOutcome::Notified {
            access_key_id: "AKIAALICE".to_owned(),
            recipients: vec![address("alice@example.com")],
        })
    );
    assert_eq!(summary.notified(), 1);
    assert_eq!(summary.evaluated_at, reference_instant());
}

#[rstest]
#[case::enabled_flag("true")]
#[case::empty_value("")]
#[case::capitalised_false("False")]
#[tokio::test]
async fn suppressed_identity_is_never_mailed(
    settings: RotationReminderSettings,
    #[case] flag: &str,
) {
    let directory = Arc::new(InMemoryIdentityDirectory::new().with_user(
        "bob",
        vec![stale("AKIABOB", "bob", 200)],
        vec![tag("key_rotation", flag), email("bob@example.com")],
    ));
    let mut mailer = MockMailSender::new();
    mailer.expect_send().times(0);

    let summary = RotationReminderJob::new(
        RotationReminderPorts::new(directory, Arc::new(mailer)),
        Arc::new(MutableClock::new(reference_instant())),
        settings,
    )
    .run()
    .await
    .expect("run succeeds");

    assert_eq!(
        summary.outcome_for("bob"),
        Some(&IdentityOutcome::Suppressed {
            access_key_id: "AKIABOB".to_owned(),
        })
    );
    assert_eq!(summary.suppressed(), 1);
}

#[rstest]
#[tokio::test]
async fn explicit_false_flag_keeps_reminders_enabled(settings: RotationReminderSettings) {
    let directory = Arc::new(InMemoryIdentityDirectory::new().with_user(
        "bob",
        vec![stale("AKIABOB", "bob", 200)],
        vec![tag("key_rotation", "false"), email("bob@example.com")],
    ));
    let mailer = Arc::new(RecordingMailSender::new());

    let summary = job(directory, mailer.clone(), settings)
        .run()
        .await
        .expect("run succeeds");

    assert_eq!(summary.notified(), 1);
    assert_eq!(mailer.copies_for("bob@example.com"), 1);
}

#[rstest]
#[tokio::test]
async fn only_the_first_stale_key_is_reported(settings: RotationReminderSettings) {
    let directory = Arc::new(InMemoryIdentityDirectory::new().with_user(
        "carol",
        vec![
            stale("AKIAFRESH", "carol", 10),
            stale("AKIAOLD", "carol", 200),
            stale("AKIAOLDER", "carol", 400),
        ],
        vec![email("carol@example.com")],
    ));
    let mailer = Arc::new(RecordingMailSender::new());

    let summary = job(directory, mailer.clone(), settings)
        .run()
        .await
        .expect("run succeeds");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("AKIAOLD belonging"));
    assert!(!sent[0].body.contains("AKIAOLDER"));
    assert_eq!(
        summary.outcome_for("carol"),
        Some(&IdentityOutcome::Notified {
            access_key_id: "AKIAOLD".to_owned(),
            recipients: vec![address("carol@example.com")],
        })
    );
}

#[rstest]
#[tokio::test]
async fn fresh_keys_skip_the_tag_lookup(settings: RotationReminderSettings) {
    let directory = Arc::new(InMemoryIdentityDirectory::new().with_user(
        "dave",
        vec![stale("AKIADAVE", "dave", 90)],
        vec![email("dave@example.com")],
    ));
    let mailer = Arc::new(RecordingMailSender::new());

    let summary = job(directory.clone(), mailer.clone(), settings)
        .run()
        .await
        .expect("run succeeds");

    assert_eq!(
        summary.outcome_for("dave"),
        Some(&IdentityOutcome::NoStaleCredential)
    );
    assert_eq!(
        directory.calls(),
        vec!["list_identities", "list_credentials:dave"]
    );
    assert_eq!(mailer.attempts(), 0);
}

#[rstest]
#[case::no_tags(vec![])]
#[case::blank_email(vec![tag("email", "   ")])]
#[case::unrelated_tags(vec![tag("team", "platform")])]
#[tokio::test]
async fn stale_key_without_recipients_sends_nothing(
    settings: RotationReminderSettings,
    #[case] tags: Vec<MetadataTag>,
) {
    let directory = Arc::new(InMemoryIdentityDirectory::new().with_user(
        "erin",
        vec![stale("AKIAERIN", "erin", 120)],
        tags,
    ));
    let mailer = Arc::new(RecordingMailSender::new());

    let summary = job(directory, mailer.clone(), settings)
        .run()
        .await
        .expect("run succeeds");

    assert_eq!(
        summary.outcome_for("erin"),
        Some(&IdentityOutcome::NoRecipients {
            access_key_id: "AKIAERIN".to_owned(),
        })
    );
    assert_eq!(summary.without_recipients(), 1);
    assert_eq!(mailer.attempts(), 0);
}

#[rstest]
#[tokio::test]
async fn every_recipient_gets_exactly_one_copy(settings: RotationReminderSettings) {
    let directory = Arc::new(InMemoryIdentityDirectory::new().with_user(
        "frank",
        vec![stale("AKIAFRANK", "frank", 100)],
        vec![
            email("frank@example.com"),
            tag("email_manager", "boss@example.com"),
            tag("email-team", "team@example.com"),
        ],
    ));
    let mailer = Arc::new(RecordingMailSender::new());

    job(directory, mailer.clone(), settings)
        .run()
        .await
        .expect("run succeeds");

    assert_eq!(mailer.attempts(), 1);
    for recipient in ["frank@example.com", "boss@example.com", "team@example.com"] {
        assert_eq!(mailer.copies_for(recipient), 1, "copies for {recipient}");
    }
}

#[rstest]
#[tokio::test]
async fn non_address_tag_values_are_handed_to_the_mailer(settings: RotationReminderSettings) {
    let directory = Arc::new(InMemoryIdentityDirectory::new().with_user(
        "gina",
        vec![stale("AKIAGINA", "gina", 100)],
        vec![tag("email", "ops-team"), tag("email2", "lead@example.com")],
    ));
    let mailer = Arc::new(RecordingMailSender::new());

    let summary = job(directory, mailer.clone(), settings)
        .run()
        .await
        .expect("run succeeds");

    assert_eq!(summary.notified(), 1);
    assert_eq!(mailer.attempts(), 1);
    assert_eq!(mailer.copies_for("ops-team"), 1);
    assert_eq!(mailer.copies_for("lead@example.com"), 1);
}

#[rstest]
#[tokio::test]
async fn enumeration_failure_aborts_the_run(settings: RotationReminderSettings) {
    let failure = IdentityDirectoryError::connection("no credentials in chain");
    let directory = Arc::new(
        InMemoryIdentityDirectory::new()
            .with_user(
                "alice",
                vec![stale("AKIAALICE", "alice", 91)],
                vec![email("alice@example.com")],
            )
            .with_list_failure(failure.clone()),
    );
    let mailer = Arc::new(RecordingMailSender::new());

    let error = job(directory.clone(), mailer.clone(), settings)
        .run()
        .await
        .expect_err("run aborts");

    assert_eq!(error, RunError::ListIdentities(failure));
    assert_eq!(directory.calls(), vec!["list_identities"]);
    assert_eq!(mailer.attempts(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn enumeration_timeout_aborts_the_run(settings: RotationReminderSettings) {
    let directory = Arc::new(
        InMemoryIdentityDirectory::new()
            .with_user(
                "alice",
                vec![stale("AKIAALICE", "alice", 91)],
                vec![email("alice@example.com")],
            )
            .with_slow_listing(Duration::from_secs(60)),
    );
    let mailer = Arc::new(RecordingMailSender::new());

    let error = job(directory.clone(), mailer.clone(), settings)
        .run()
        .await
        .expect_err("run aborts");

    assert_eq!(
        error,
        RunError::ListIdentitiesTimedOut {
            timeout: Duration::from_secs(5),
        }
    );
    assert_eq!(directory.calls(), vec!["list_identities"]);
    assert_eq!(mailer.attempts(), 0);
}

#[rstest]
#[tokio::test]
async fn credential_failure_skips_only_that_identity(settings: RotationReminderSettings) {
    let directory = Arc::new(
        InMemoryIdentityDirectory::new()
            .with_credentials_failure("ghost", IdentityDirectoryError::query("access denied"))
            .with_user(
                "alice",
                vec![stale("AKIAALICE", "alice", 91)],
                vec![email("alice@example.com")],
            ),
    );
    let mailer = Arc::new(RecordingMailSender::new());

    let summary = job(directory, mailer.clone(), settings)
        .run()
        .await
        .expect("run succeeds");

    assert!(matches!(
        summary.outcome_for("ghost"),
        Some(IdentityOutcome::CredentialsUnavailable { reason }) if reason.contains("access denied")
    ));
    assert_eq!(mailer.copies_for("alice@example.com"), 1);
    assert_eq!(summary.failures(), 1);
    assert_eq!(summary.notified(), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn slow_credential_listing_is_skipped(settings: RotationReminderSettings) {
    let directory = Arc::new(
        InMemoryIdentityDirectory::new()
            .with_slow_credentials(
                "sloth",
                vec![stale("AKIASLOTH", "sloth", 300)],
                Duration::from_secs(30),
            )
            .with_user(
                "alice",
                vec![stale("AKIAALICE", "alice", 91)],
                vec![email("alice@example.com")],
            ),
    );
    let mailer = Arc::new(RecordingMailSender::new());

    let summary = job(directory, mailer.clone(), settings)
        .run()
        .await
        .expect("run succeeds");

    assert!(matches!(
        summary.outcome_for("sloth"),
        Some(IdentityOutcome::CredentialsUnavailable { reason }) if reason.contains("no response within")
    ));
    assert_eq!(mailer.copies_for("alice@example.com"), 1);
}

#[rstest]
#[tokio::test]
async fn tag_failure_skips_only_that_identity(settings: RotationReminderSettings) {
    let directory = Arc::new(
        InMemoryIdentityDirectory::new()
            .with_tags_failure(
                "hana",
                vec![stale("AKIAHANA", "hana", 95)],
                IdentityDirectoryError::timeout("ListUserTags"),
            )
            .with_user(
                "alice",
                vec![stale("AKIAALICE", "alice", 91)],
                vec![email("alice@example.com")],
            ),
    );
    let mailer = Arc::new(RecordingMailSender::new());

    let summary = job(directory, mailer.clone(), settings)
        .run()
        .await
        .expect("run succeeds");

    assert!(matches!(
        summary.outcome_for("hana"),
        Some(IdentityOutcome::TagsUnavailable { access_key_id, .. }) if access_key_id == "AKIAHANA"
    ));
    assert_eq!(mailer.attempts(), 1);
    assert_eq!(mailer.copies_for("alice@example.com"), 1);
}

#[rstest]
#[tokio::test]
async fn delivery_failure_moves_on_to_the_next_identity(settings: RotationReminderSettings) {
    let directory = Arc::new(
        InMemoryIdentityDirectory::new()
            .with_user(
                "ivan",
                vec![stale("AKIAIVAN", "ivan", 150)],
                vec![email("ivan@example.com")],
            )
            .with_user(
                "alice",
                vec![stale("AKIAALICE", "alice", 91)],
                vec![email("alice@example.com")],
            ),
    );
    let mailer = Arc::new(RecordingMailSender::new().failing_for(
        "ivan@example.com",
        MailSenderError::rejected("Email address is not verified"),
    ));

    let summary = job(directory, mailer.clone(), settings)
        .run()
        .await
        .expect("run succeeds");

    assert_eq!(
        summary.outcome_for("ivan"),
        Some(&IdentityOutcome::DeliveryFailed {
            access_key_id: "AKIAIVAN".to_owned(),
            reason: "mail service rejected message: Email address is not verified".to_owned(),
        })
    );
    assert_eq!(mailer.attempts(), 2);
    assert_eq!(mailer.copies_for("alice@example.com"), 1);
    assert_eq!(summary.failures(), 1);
}

#[rstest]
#[tokio::test]
async fn identities_are_processed_in_enumeration_order(settings: RotationReminderSettings) {
    let directory = Arc::new(
        InMemoryIdentityDirectory::new()
            .with_user(
                "zed",
                vec![stale("AKIAZED", "zed", 91)],
                vec![email("zed@example.com")],
            )
            .with_user("amy", vec![stale("AKIAAMY", "amy", 1)], vec![]),
    );
    let mailer = Arc::new(RecordingMailSender::new());

    let summary = job(directory.clone(), mailer, settings)
        .run()
        .await
        .expect("run succeeds");

    let order: Vec<_> = summary
        .reports
        .iter()
        .map(|report| report.user_name.as_str())
        .collect();
    assert_eq!(order, vec!["zed", "amy"]);
    assert_eq!(
        directory.calls(),
        vec![
            "list_identities",
            "list_credentials:zed",
            "list_tags:zed",
            "list_credentials:amy",
        ]
    );
}

#[rstest]
#[tokio::test]
async fn clock_is_read_once_per_run(settings: RotationReminderSettings) {
    let directory = Arc::new(
        InMemoryIdentityDirectory::new()
            .with_user(
                "alice",
                vec![stale("AKIAALICE", "alice", 91)],
                vec![email("alice@example.com")],
            )
            .with_user(
                "carol",
                vec![stale("AKIACAROL", "carol", 200)],
                vec![email("carol@example.com")],
            ),
    );
    let mut clock = MockClock::new();
    clock
        .expect_utc()
        .times(1)
        .returning(reference_instant);

    let summary = RotationReminderJob::new(
        RotationReminderPorts::new(directory, Arc::new(RecordingMailSender::new())),
        Arc::new(clock),
        settings,
    )
    .run()
    .await
    .expect("run succeeds");

    assert_eq!(summary.notified(), 2);
    assert_eq!(summary.evaluated_at, reference_instant());
}

#[rstest]
#[tokio::test]
async fn directory_queries_use_the_fixed_page_size(settings: RotationReminderSettings) {
    let mut directory = MockIdentityDirectory::new();
    directory
        .expect_list_identities()
        .withf(|max_items| *max_items == DIRECTORY_PAGE_SIZE)
        .times(1)
        .returning(|_| Ok(vec![Identity::new("alice")]));
    directory
        .expect_list_credentials()
        .times(1)
        .returning(|_| Ok(vec![stale("AKIAALICE", "alice", 91)]));
    directory
        .expect_list_tags()
        .withf(|identity, max_items| {
            identity.user_name() == "alice" && *max_items == DIRECTORY_PAGE_SIZE
        })
        .times(1)
        .returning(|_, _| Ok(vec![email("alice@example.com")]));

    let mut mailer = MockMailSender::new();
    mailer
        .expect_send()
        .withf(|message| message.recipients == vec![address("alice@example.com")])
        .times(1)
        .returning(|_| {
            Ok(DeliveryReceipt {
                message_id: "0100-abc".to_owned(),
            })
        });

    let summary = RotationReminderJob::new(
        RotationReminderPorts::new(Arc::new(directory), Arc::new(mailer)),
        Arc::new(MutableClock::new(reference_instant())),
        settings,
    )
    .run()
    .await
    .expect("run succeeds");

    assert_eq!(summary.notified(), 1);
}

#[rstest]
#[tokio::test]
async fn empty_directory_completes_without_work(settings: RotationReminderSettings) {
    let directory = Arc::new(InMemoryIdentityDirectory::new());
    let mailer = Arc::new(RecordingMailSender::new());

    let summary = job(directory, mailer.clone(), settings)
        .run()
        .await
        .expect("run succeeds");

    assert_eq!(summary.identities(), 0);
    assert_eq!(mailer.attempts(), 0);
}

#[rstest]
#[tokio::test]
async fn repeated_runs_re_evaluate_against_the_new_instant(settings: RotationReminderSettings) {
    let directory = Arc::new(
        InMemoryIdentityDirectory::new()
            .with_user(
                "alice",
                vec![stale("AKIAALICE", "alice", 120)],
                vec![email("alice@example.com")],
            )
            .with_user(
                "jules",
                vec![stale("AKIAJULES", "jules", 70)],
                vec![email("jules@example.com")],
            ),
    );
    let mailer = Arc::new(RecordingMailSender::new());
    let clock = Arc::new(MutableClock::new(reference_instant()));
    assert_eq!(settings.threshold.days(), 90);
    let job = RotationReminderJob::new(
        RotationReminderPorts::new(directory, mailer.clone()),
        clock.clone(),
        settings,
    );

    let first = job.run().await.expect("first run succeeds");
    clock.advance_days(30);
    let second = job.run().await.expect("second run succeeds");

    assert_eq!(first.notified(), 1);
    assert_eq!(second.notified(), 2);
    assert_eq!(second.evaluated_at - first.evaluated_at, chrono::TimeDelta::days(30));
    assert_eq!(mailer.copies_for("alice@example.com"), 2);
    assert_eq!(mailer.copies_for("jules@example.com"), 1);
}
