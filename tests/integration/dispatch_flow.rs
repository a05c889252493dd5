use std::error::Error;
use std::sync::Arc;

use tokio::sync::mpsc;

use cliptrigger::engine::{Dispatcher, JobOutcome, SourceEvent};

use crate::common::builders::{ConfigFileBuilder, RuleConfigBuilder};
use crate::common::{FakeRunner, Harness, Script, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn dispatcher_for(h: &Harness) -> Dispatcher {
    let cfg = ConfigFileBuilder::new()
        .with_rule(
            RuleConfigBuilder::new(r"^https://video\.example/", "fetch")
                .name("video")
                .arg("--quiet")
                .arg("{clipboard}")
                .build(),
        )
        .with_rule(
            RuleConfigBuilder::new(r"^https://", "archive")
                .name("archive")
                .arg("{clipboard}")
                .build(),
        )
        .build();
    Dispatcher::new(h.ctx.clone(), Arc::new(cfg.rules), h.queue.clone())
}

#[tokio::test]
async fn matching_text_enqueues_one_job_per_rule_in_rule_order() -> TestResult {
    let h = Harness::new(FakeRunner::new());
    let dispatcher = dispatcher_for(&h);

    let ids = dispatcher.dispatch_text("https://video.example/42");
    assert_eq!(ids.len(), 2);
    assert_eq!(h.queue.len(), 2);

    let out = h.output();
    assert!(out.contains(&"[Queue] Enqueued #1: video".to_string()));
    assert!(out.contains(&"[Queue] Status: 1 waiting".to_string()));
    assert!(out.contains(&"[Queue] Enqueued #2: archive".to_string()));
    assert!(out.contains(&"[Queue] Status: 2 waiting".to_string()));
    Ok(())
}

#[tokio::test]
async fn unmatched_text_enqueues_nothing() -> TestResult {
    let h = Harness::new(FakeRunner::new());
    let dispatcher = dispatcher_for(&h);

    assert!(dispatcher.dispatch_text("just some words").is_empty());
    assert!(h.queue.is_empty());
    Ok(())
}

#[tokio::test]
async fn observed_texts_flow_through_to_the_runner() -> TestResult {
    let h = Harness::new(
        FakeRunner::new()
            .script("fetch", Script::ok().stdout("fetched"))
            .script("archive", Script::ok().exit(1)),
    );
    let dispatcher = dispatcher_for(&h);
    let worker = h.spawn_worker();

    let (tx, rx) = mpsc::channel(8);
    let dispatch = tokio::spawn(dispatcher.run(rx, h.cancel.clone()));

    tx.send(SourceEvent::TextObserved("https://video.example/1".into())).await?;
    tx.send(SourceEvent::TextObserved("https://other.example/2".into())).await?;
    drop(tx);
    with_timeout(dispatch).await?;

    h.queue.close();
    let report = with_timeout(worker).await?;

    let started: Vec<_> = h
        .runner
        .started()
        .into_iter()
        .map(|r| (r.command, r.args))
        .collect();
    assert_eq!(
        started,
        vec![
            ("fetch".to_string(), vec!["--quiet".to_string(), "https://video.example/1".to_string()]),
            ("archive".to_string(), vec!["https://video.example/1".to_string()]),
            ("archive".to_string(), vec!["https://other.example/2".to_string()]),
        ]
    );

    let outcomes: Vec<_> = report.finished.iter().map(|(_, o)| o.clone()).collect();
    assert_eq!(
        outcomes,
        vec![
            JobOutcome::Succeeded,
            JobOutcome::NonZeroExit(1),
            JobOutcome::NonZeroExit(1),
        ]
    );
    assert_eq!(h.runner.max_concurrency(), 1);
    Ok(())
}

#[tokio::test]
async fn dispatcher_stops_on_cancel() -> TestResult {
    let h = Harness::new(FakeRunner::new());
    let dispatcher = dispatcher_for(&h);

    let (_tx, rx) = mpsc::channel::<SourceEvent>(8);
    let dispatch = tokio::spawn(dispatcher.run(rx, h.cancel.clone()));
    h.cancel.cancel();
    with_timeout(dispatch).await?;
    Ok(())
}
