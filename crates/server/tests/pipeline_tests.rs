//! End-to-end request pipeline scenarios.

mod common;

use common::{StubAuthApi, mint_token};
use shortlink_core::{Alias, AliasGenerator, TargetUrl};
use shortlink_server::{
    Envelope, ErrorKind, JwtVerifier, Operation, Outcome, PipelineError, RequestPipeline,
};
use shortlink_sso::{RetryPolicy, SsoClient};
use shortlink_store::{AliasSaver, MemoryStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tonic::Status;

const SECRET: &str = "pipeline-secret";
const MAX_ATTEMPTS: u32 = 4;

fn pipeline_with(api: Arc<StubAuthApi>, attempt_timeout: Duration) -> RequestPipeline {
    let policy = RetryPolicy {
        max_attempts: MAX_ATTEMPTS,
        attempt_timeout,
        backoff: Duration::from_millis(5),
    };
    RequestPipeline::new(
        Arc::new(MemoryStore::new()),
        Arc::new(JwtVerifier::new(SECRET, Duration::from_secs(30))),
        SsoClient::new(api, policy, 1),
        AliasSaver::new(AliasGenerator::new(6), 10),
    )
}

fn pipeline(api: Arc<StubAuthApi>) -> RequestPipeline {
    pipeline_with(api, Duration::from_millis(200))
}

fn alias(s: &str) -> Alias {
    Alias::parse(s).unwrap()
}

fn target(s: &str) -> TargetUrl {
    TargetUrl::parse(s).unwrap()
}

fn save(alias_name: Option<&str>, url: &str, credential: Option<String>) -> Envelope {
    Envelope {
        operation: Operation::Save {
            alias: alias_name.map(alias),
            target: target(url),
        },
        credential,
    }
}

fn delete(alias_name: &str, credential: Option<String>) -> Envelope {
    Envelope {
        operation: Operation::Delete {
            alias: alias(alias_name),
        },
        credential,
    }
}

fn resolve(alias_name: &str) -> Envelope {
    Envelope {
        operation: Operation::Resolve {
            alias: alias(alias_name),
        },
        credential: None,
    }
}

fn user(uid: i64) -> Option<String> {
    Some(mint_token(SECRET, uid, 3600))
}

fn kind(result: Result<Outcome, PipelineError>) -> ErrorKind {
    result.unwrap_err().kind
}

#[tokio::test]
async fn test_save_resolve_delete_scenario() {
    let api = Arc::new(StubAuthApi::new(SECRET));
    api.grant_admin(1);
    let p = pipeline(api.clone());

    let saved = p
        .execute(save(Some("go"), "https://example.com", user(5)), None)
        .await
        .unwrap();
    assert_eq!(saved, Outcome::Saved { alias: alias("go") });

    let resolved = p.execute(resolve("go"), None).await.unwrap();
    assert_eq!(
        resolved,
        Outcome::Resolved {
            target: target("https://example.com")
        }
    );

    let deleted = p.execute(delete("go", user(1)), None).await.unwrap();
    assert_eq!(deleted, Outcome::Deleted);
    assert_eq!(kind(p.execute(resolve("go"), None).await), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_resolve_never_saved() {
    let p = pipeline(Arc::new(StubAuthApi::new(SECRET)));
    assert_eq!(kind(p.execute(resolve("ghost"), None).await), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_non_admin_delete_keeps_record() {
    let api = Arc::new(StubAuthApi::new(SECRET));
    let p = pipeline(api.clone());
    p.execute(save(Some("go"), "https://example.com", user(5)), None)
        .await
        .unwrap();

    assert_eq!(
        kind(p.execute(delete("go", user(5)), None).await),
        ErrorKind::Forbidden
    );
    assert!(p.execute(resolve("go"), None).await.is_ok());
}

#[tokio::test]
async fn test_unauthenticated_delete_precedes_remote_call() {
    let api = Arc::new(StubAuthApi::new(SECRET));
    let p = pipeline(api.clone());

    let expired = Some(mint_token(SECRET, 1, -3600));
    let forged = Some(mint_token("other-secret", 1, 3600));
    for credential in [expired, forged, None] {
        assert_eq!(
            kind(p.execute(delete("go", credential), None).await),
            ErrorKind::Unauthenticated
        );
    }
    assert_eq!(api.is_admin_count(), 0);
}

#[tokio::test]
async fn test_delete_missing_alias_as_admin() {
    let api = Arc::new(StubAuthApi::new(SECRET));
    api.grant_admin(1);
    let p = pipeline(api);

    assert_eq!(
        kind(p.execute(delete("ghost", user(1)), None).await),
        ErrorKind::NotFound
    );
}

#[tokio::test(start_paused = true)]
async fn test_transient_authority_failures_are_bounded() {
    let api = Arc::new(StubAuthApi::new(SECRET));
    api.grant_admin(1);
    api.fail_with(Status::not_found("user lookup raced"));
    let p = pipeline(api.clone());
    p.execute(save(Some("go"), "https://example.com", user(5)), None)
        .await
        .unwrap();

    assert_eq!(
        kind(p.execute(delete("go", user(1)), None).await),
        ErrorKind::RemoteUnavailable
    );
    assert_eq!(api.is_admin_count(), MAX_ATTEMPTS);
    assert!(p.execute(resolve("go"), None).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_terminal_authority_failure_is_not_retried() {
    let api = Arc::new(StubAuthApi::new(SECRET));
    api.fail_with(Status::invalid_argument("bad user id"));
    let p = pipeline(api.clone());

    assert_eq!(
        kind(p.execute(delete("go", user(1)), None).await),
        ErrorKind::RemoteRejected
    );
    assert_eq!(api.is_admin_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_bounds_authority_calls() {
    let api = Arc::new(StubAuthApi::new(SECRET));
    api.grant_admin(1);
    api.delay_by(Duration::from_secs(60));
    let p = pipeline_with(api.clone(), Duration::from_secs(5));
    p.execute(save(Some("go"), "https://example.com", user(5)), None)
        .await
        .unwrap();

    let start = Instant::now();
    let deadline = start + Duration::from_secs(1);
    let result = p.execute(delete("go", user(1)), Some(deadline)).await;

    assert_eq!(kind(result), ErrorKind::RemoteUnavailable);
    assert!(start.elapsed() <= Duration::from_millis(1100));
    assert!(api.is_admin_count() < MAX_ATTEMPTS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_of_same_alias() {
    let p = pipeline(Arc::new(StubAuthApi::new(SECRET)));

    let handles: Vec<_> = (0..2)
        .map(|i| {
            let p = p.clone();
            tokio::spawn(async move {
                p.execute(
                    save(Some("dup"), &format!("https://example.com/{i}"), user(5)),
                    None,
                )
                .await
            })
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) if e.kind == ErrorKind::Conflict => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!((successes, conflicts), (1, 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_generated_aliases_are_unique() {
    let p = pipeline(Arc::new(StubAuthApi::new(SECRET)));

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let p = p.clone();
            tokio::spawn(async move {
                p.execute(save(None, "https://example.com", user(5)), None)
                    .await
            })
        })
        .collect();

    let mut seen = std::collections::HashSet::new();
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            Outcome::Saved { alias } => assert!(seen.insert(alias)),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(seen.len(), 50);
}
