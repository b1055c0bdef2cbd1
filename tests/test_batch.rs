//! Integration tests for batch runs.
//!
//! Tests cover:
//! - Natural page ordering and the raw accumulator
//! - Partial failure, empty batches and parameter validation
//! - Batch-level normalization across page breaks
//! - Progress, cancellation, timeouts and parallel jobs

mod common;

use bookocr::CancelFlag;
use common::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn test_pages_follow_natural_order() -> anyhow::Result<()> {
    let engine = Arc::new(
        ScriptedEngine::new()
            .text(20, "one")
            .text(30, "two")
            .text(40, "ten"),
    );
    let runner = make_runner(engine.clone(), BatchOptions::default());
    let pages = vec![
        make_page("p10.png", 40),
        make_page("p2.png", 30),
        make_page("p1.png", 20),
    ];

    let output = runner.run(pages, &test_params(), None).await?;

    let names: Vec<&str> = output.pages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["p1.png", "p2.png", "p10.png"]);
    assert_eq!(output.raw_combined, "one\ntwo\nten");
    assert_eq!(output.normalized_combined, "one two ten");
    assert_eq!(engine.calls(), 3);
    Ok(())
}

#[tokio::test]
async fn test_failed_page_leaves_placeholder() -> anyhow::Result<()> {
    let engine = Arc::new(
        ScriptedEngine::new()
            .text(20, "a")
            .fail(30, "engine crashed")
            .text(40, "c"),
    );
    let runner = make_runner(engine, BatchOptions::default());
    let pages = vec![
        make_page("1.png", 20),
        make_page("2.png", 30),
        make_page("3.png", 40),
    ];

    let output = runner.run(pages, &test_params(), None).await?;

    assert_eq!(output.pages.len(), 3);
    assert_eq!(output.pages[1].raw_text, "");
    assert!(output.pages[1].is_placeholder());
    assert!(!output.pages[0].is_placeholder());
    assert_eq!(output.raw_combined, "a\n\nc");

    let warnings: Vec<(&str, &str)> = output.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].0, "2.png");
    assert!(warnings[0].1.contains("engine crashed"));
    Ok(())
}

#[tokio::test]
async fn test_empty_batch_is_an_error() -> anyhow::Result<()> {
    let runner = make_runner(Arc::new(ScriptedEngine::new()), BatchOptions::default());
    let result = runner.run(Vec::new(), &test_params(), None).await;
    assert!(matches!(result, Err(Error::EmptyBatch)));
    Ok(())
}

#[tokio::test]
async fn test_invalid_parameters_fail_before_recognition() -> anyhow::Result<()> {
    let engine = Arc::new(ScriptedEngine::new().text(20, "never"));
    let runner = make_runner(engine.clone(), BatchOptions::default());

    let even_kernel = PreprocessParameters {
        blur_kernel_size: 4,
        ..test_params()
    };
    let result = runner
        .run(vec![make_page("p1.png", 20)], &even_kernel, None)
        .await;
    assert!(matches!(result, Err(Error::InvalidParameter(_))));

    let shrinking = PreprocessParameters {
        scale_factor: 0.5,
        ..test_params()
    };
    let result = runner.run(Vec::new(), &shrinking, None).await;
    assert!(matches!(result, Err(Error::InvalidParameter(_))));

    let oversized = PreprocessParameters {
        scale_factor: 1.0e9,
        ..test_params()
    };
    let result = runner
        .run(vec![make_page("p1.png", 20)], &oversized, None)
        .await;
    assert!(matches!(result, Err(Error::InvalidParameter(_))));

    assert_eq!(engine.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_sentences_rejoin_across_pages() -> anyhow::Result<()> {
    let engine = Arc::new(
        ScriptedEngine::new()
            .text(20, "Le chat ct")
            .text(30, "le chien.")
            .text(40, "Fin."),
    );
    let runner = make_runner(engine, BatchOptions::default());
    let pages = vec![
        make_page("p1.png", 20),
        make_page("p2.png", 30),
        make_page("p3.png", 40),
    ];

    let output = runner.run(pages, &test_params(), None).await?;

    // The raw artifact is never corrected
    assert_eq!(output.raw_combined, "Le chat ct\nle chien.\nFin.");
    assert_eq!(output.normalized_combined, "Le chat et le chien.\nFin.");
    assert_eq!(output.pages[0].normalized_text, "Le chat et");
    Ok(())
}

#[tokio::test]
async fn test_progress_reported_per_page() -> anyhow::Result<()> {
    let engine = Arc::new(
        ScriptedEngine::new()
            .text(20, "a")
            .text(30, "b")
            .text(40, "c")
            .text(50, "d"),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let runner = make_runner(engine, BatchOptions::default())
        .with_progress(move |p: Progress| sink.lock().unwrap().push(p.fraction()));
    let pages = [20, 30, 40, 50]
        .iter()
        .enumerate()
        .map(|(i, w)| make_page(&format!("p{}.png", i + 1), *w))
        .collect();

    runner.run(pages, &test_params(), None).await?;

    assert_eq!(*seen.lock().unwrap(), vec![0.25, 0.5, 0.75, 1.0]);
    Ok(())
}

#[tokio::test]
async fn test_cancel_stops_before_next_page() -> anyhow::Result<()> {
    let engine = Arc::new(
        ScriptedEngine::new()
            .text(20, "a")
            .text(30, "b")
            .text(40, "c"),
    );
    let flag = CancelFlag::new();
    let trigger = flag.clone();
    let runner = make_runner(engine.clone(), BatchOptions::default())
        .with_cancel_flag(flag)
        .with_progress(move |_| trigger.cancel());
    let pages = vec![
        make_page("p1.png", 20),
        make_page("p2.png", 30),
        make_page("p3.png", 40),
    ];

    let result = runner.run(pages, &test_params(), None).await;

    match result {
        Err(Error::Cancelled {
            completed,
            total,
            partial,
        }) => {
            assert_eq!((completed, total), (1, 3));
            // The finished page survives the cancel
            assert_eq!(partial.pages.len(), 1);
            assert_eq!(partial.pages[0].name, "p1.png");
            assert_eq!(partial.raw_combined, "a");
            assert_eq!(partial.normalized_combined, "a");
        }
        other => panic!("expected a cancelled batch, got {:?}", other.map(|o| o.raw_combined)),
    }
    assert_eq!(engine.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_slow_page_times_out() -> anyhow::Result<()> {
    let engine = Arc::new(
        ScriptedEngine::new()
            .text(20, "fast")
            .slow(30, "slow", Duration::from_millis(300)),
    );
    let options = BatchOptions {
        jobs: 1,
        page_timeout: Some(Duration::from_millis(20)),
    };
    let runner = make_runner(engine, options);
    let pages = vec![make_page("p1.png", 20), make_page("p2.png", 30)];

    let output = runner.run(pages, &test_params(), None).await?;

    assert_eq!(output.raw_combined, "fast\n");
    let warning = output.pages[1].warning.as_deref().unwrap_or_default();
    assert!(warning.contains("timed out"), "unexpected warning: {}", warning);
    Ok(())
}

#[tokio::test]
async fn test_parallel_jobs_keep_page_order() -> anyhow::Result<()> {
    let engine = Arc::new(
        ScriptedEngine::new()
            .slow(20, "first", Duration::from_millis(150))
            .text(30, "second")
            .text(40, "third"),
    );
    let options = BatchOptions {
        jobs: 3,
        page_timeout: None,
    };
    let runner = make_runner(engine.clone(), options);
    let pages = vec![
        make_page("p3.png", 40),
        make_page("p1.png", 20),
        make_page("p2.png", 30),
    ];

    let output = runner.run(pages, &test_params(), None).await?;

    assert_eq!(output.raw_combined, "first\nsecond\nthird");
    assert_eq!(engine.calls(), 3);
    Ok(())
}

#[tokio::test]
async fn test_split_lines_default_from_first_page() -> anyhow::Result<()> {
    let engine = Arc::new(ScriptedEngine::new().text(600, "x").text(700, "y"));
    let runner = make_runner(engine, BatchOptions::default());

    let output = runner
        .run(
            vec![make_page("b.png", 700), make_page("a.png", 600)],
            &test_params(),
            None,
        )
        .await?;
    assert_eq!(
        output.split_lines,
        Some(SplitLines {
            left: 250,
            right: 350
        })
    );

    let output = runner
        .run(
            vec![make_page("a.png", 600)],
            &test_params(),
            Some(SplitLines {
                left: 10,
                right: 9000,
            }),
        )
        .await?;
    assert_eq!(
        output.split_lines,
        Some(SplitLines {
            left: 10,
            right: 600
        })
    );
    Ok(())
}
