use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn scraper() -> Command {
    let mut cmd = Command::cargo_bin("diff-scraper").expect("Binary exists");
    cmd.env_remove("GITLAB_PRIVATE_TOKEN");
    cmd
}

fn valid_args<'a>(since: &'a str, until: &'a str) -> Vec<&'a str> {
    vec![
        "--project_id",
        "1",
        "--private_token",
        "token",
        "--author_email",
        "a@x.com",
        "--since",
        since,
        "--until",
        until,
        // Nothing listens here; the run must stop before any request anyway.
        "--base_url",
        "http://127.0.0.1:9/api/v4",
    ]
}

#[test]
fn no_arguments_prints_usage_and_exits_with_one() {
    scraper()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn malformed_since_is_rejected_before_any_output() {
    let workdir = tempdir().unwrap();

    scraper()
        .current_dir(workdir.path())
        .args(valid_args("2024/01/01", "2024-01-31"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("YYYY-MM-DD"));

    assert_eq!(std::fs::read_dir(workdir.path()).unwrap().count(), 0);
}

#[test]
fn inverted_window_is_rejected_before_any_output() {
    let workdir = tempdir().unwrap();

    scraper()
        .current_dir(workdir.path())
        .args(valid_args("2024-02-01", "2024-01-31"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("is after"));

    assert_eq!(std::fs::read_dir(workdir.path()).unwrap().count(), 0);
}

#[test]
fn group_and_project_are_mutually_exclusive() {
    let mut args = valid_args("2024-01-01", "2024-01-31");
    args.extend(["--group_id", "524"]);

    scraper()
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn one_of_group_or_project_is_required() {
    scraper()
        .args([
            "--private_token",
            "token",
            "--author_email",
            "a@x.com",
            "--since",
            "2024-01-01",
            "--until",
            "2024-01-31",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--group_id").or(predicate::str::contains("--project_id")));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use diff_scraper::cli::{run_in, Cli};

    let workdir = tempdir().unwrap();
    let cli = Cli {
        group_id: Some("524".into()),
        project_id: None,
        private_token: "token".into(),
        author_email: "a@x.com".into(),
        since: chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        until: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        base_url: None,
        config: None,
        verbose: false,
    };

    let result = run_in(cli, workdir.path()).await;

    assert!(result.is_err(), "inverted window must fail");
    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
