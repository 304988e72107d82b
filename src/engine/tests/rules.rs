use std::sync::Arc;

use super::common::*;
use crate::{
    config::{Change, GoChange, PatternFilter},
    engine::EngineConfig,
    error::UpdatebotError,
    forge::traits::MockForge,
    test_helpers::create_test_repository,
};
use color_eyre::eyre::eyre;

fn go_change() -> Change {
    Change::GoModule(GoChange {
        owners: vec!["acme".into()],
        repositories: PatternFilter::default(),
        package: "github.com/acme/lib".into(),
        upgrade_packages: PatternFilter::default(),
    })
}

#[tokio::test]
async fn empty_configuration_creates_nothing() {
    let reconciler = Arc::new(RecordingReconciler::default());
    let engine = create_test_engine(
        &reconciler,
        MockForge::new(),
        EngineConfig::default(),
    );

    let state = engine.run(update_config(vec![])).await.unwrap();

    assert!(state.pull_requests.is_empty());
    assert!(state.pull_request_shas.is_empty());
    assert!(reconciler.calls().is_empty());
}

#[tokio::test]
async fn rule_without_urls_is_skipped() {
    let reconciler = Arc::new(RecordingReconciler::default());
    let engine = create_test_engine(
        &reconciler,
        MockForge::new(),
        EngineConfig::default(),
    );

    let config = update_config(vec![
        rule(vec![], vec![settings_change()]),
        rule(vec![WIDGETS_URL], vec![settings_change()]),
    ]);

    let state = engine.run(config).await.unwrap();

    assert_eq!(state.pull_requests.len(), 1);
    assert_eq!(reconciler.calls().len(), 1);
    assert_eq!(reconciler.calls()[0].git_url, WIDGETS_URL);
}

#[tokio::test]
async fn empty_url_is_skipped() {
    let reconciler = Arc::new(RecordingReconciler::default());
    let engine = create_test_engine(
        &reconciler,
        MockForge::new(),
        EngineConfig::default(),
    );

    let config =
        update_config(vec![rule(vec!["", GADGETS_URL], vec![settings_change()])]);

    let state = engine.run(config).await.unwrap();

    assert_eq!(state.pull_requests.len(), 1);
    assert_eq!(
        reconciler
            .calls()
            .iter()
            .map(|c| c.git_url.as_str())
            .collect::<Vec<&str>>(),
        vec![GADGETS_URL]
    );
}

#[tokio::test]
async fn rules_and_urls_are_processed_in_order() {
    let reconciler = Arc::new(RecordingReconciler::default());
    let engine = create_test_engine(
        &reconciler,
        MockForge::new(),
        EngineConfig::default(),
    );

    let config = update_config(vec![
        rule(vec![GADGETS_URL, WIDGETS_URL], vec![settings_change()]),
        rule(vec![GADGETS_URL], vec![settings_change()]),
    ]);

    let state = engine.run(config).await.unwrap();

    let urls = reconciler
        .calls()
        .iter()
        .map(|c| c.git_url.clone())
        .collect::<Vec<String>>();
    assert_eq!(urls, vec![GADGETS_URL, WIDGETS_URL, GADGETS_URL]);

    let numbers = state
        .pull_requests
        .iter()
        .map(|pr| pr.number)
        .collect::<Vec<u64>>();
    assert_eq!(numbers, vec![1, 2, 3]);

    // the last pull request for a repository wins
    assert_eq!(state.pull_request_shas.len(), 2);
    assert_eq!(state.pull_request_shas[GADGETS_URL], "sha-3");
    assert_eq!(state.pull_request_shas[WIDGETS_URL], "sha-2");
}

#[tokio::test]
async fn discovered_duplicates_are_processed_each_time() {
    let mut forge = MockForge::new();
    forge
        .expect_list_repositories()
        .returning(|_| Ok(vec![create_test_repository("acme", "widgets")]));
    forge.expect_get_file_content().returning(|_| {
        Ok(Some(
            "module github.com/acme/widgets\n\nrequire github.com/acme/lib v1.0.0\n"
                .into(),
        ))
    });

    let reconciler = Arc::new(RecordingReconciler::default());
    let engine =
        create_test_engine(&reconciler, forge, EngineConfig::default());

    let config = update_config(vec![rule(
        vec![WIDGETS_URL],
        vec![go_change(), settings_change()],
    )]);

    engine.run(config).await.unwrap();

    let calls = reconciler.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.git_url == WIDGETS_URL));
}

#[tokio::test]
async fn resolver_failure_stops_the_run() {
    let mut forge = MockForge::new();
    forge
        .expect_list_repositories()
        .returning(|_| Err(eyre!("rate limited")));

    let reconciler = Arc::new(RecordingReconciler::default());
    let engine =
        create_test_engine(&reconciler, forge, EngineConfig::default());

    let config = update_config(vec![
        rule(vec![], vec![go_change()]),
        rule(vec![WIDGETS_URL], vec![settings_change()]),
    ]);

    let err = engine.run(config).await.unwrap_err();

    assert_eq!(err.to_string(), "failed to find URLs");
    assert!(matches!(
        err.downcast_ref::<UpdatebotError>(),
        Some(UpdatebotError::Discovery(_))
    ));
    assert!(reconciler.calls().is_empty());
}

#[tokio::test]
async fn fork_flag_comes_from_each_rule() {
    let reconciler = Arc::new(RecordingReconciler::default());
    let engine = create_test_engine(
        &reconciler,
        MockForge::new(),
        EngineConfig::default(),
    );

    let mut forked = rule(vec![WIDGETS_URL], vec![settings_change()]);
    forked.fork = true;

    let config = update_config(vec![
        forked,
        rule(vec![GADGETS_URL], vec![settings_change()]),
    ]);

    engine.run(config).await.unwrap();

    let calls = reconciler.calls();
    assert!(calls[0].fork);
    assert!(!calls[1].fork);
}
