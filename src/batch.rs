use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{BatchOutput, OcrResult, PageImage, PreprocessParameters, Progress, SplitLines};
use crate::ordering;
use crate::pipeline::DebugConfig;
use crate::preprocess::Preprocessor;
use crate::recognition::RecognitionAdapter;
use crate::text::TextNormalizer;

/// Separator placed between consecutive pages in the raw artifact
pub const PAGE_SEPARATOR: &str = "\n";

/// Shared flag asking a running batch to stop before its next page
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Pages in flight at once; 1 runs strictly in order
    pub jobs: usize,
    /// Give up on a page after this long and record a placeholder
    pub page_timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            page_timeout: None,
        }
    }
}

type ProgressFn = Arc<dyn Fn(Progress) + Send + Sync>;

/// Runs a set of pages through preprocessing, recognition and text repair.
///
/// Normalization runs once over the joined text of the whole batch, so
/// sentences that continue across a page break are rejoined.
pub struct BatchRunner {
    adapter: RecognitionAdapter,
    normalizer: TextNormalizer,
    options: BatchOptions,
    debug: Option<DebugConfig>,
    progress: Option<ProgressFn>,
    cancel: CancelFlag,
}

impl BatchRunner {
    pub fn new(adapter: RecognitionAdapter, normalizer: TextNormalizer) -> Self {
        Self {
            adapter,
            normalizer,
            options: BatchOptions::default(),
            debug: None,
            progress: None,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_debug(mut self, debug: Option<DebugConfig>) -> Self {
        self.debug = debug;
        self
    }

    /// Called after every finished page
    pub fn with_progress(mut self, progress: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Process `pages` and return both text artifacts.
    ///
    /// Parameters are checked before any page is touched. A page whose
    /// recognition fails contributes an empty string and a warning; the batch
    /// still completes. `split_lines` defaults from the first page's width.
    pub async fn run(
        &self,
        pages: Vec<PageImage>,
        params: &PreprocessParameters,
        split_lines: Option<SplitLines>,
    ) -> Result<BatchOutput> {
        let preprocessor = Preprocessor::new(*params)?.with_debug(self.debug.clone());
        if pages.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let pages = ordering::order(pages);
        let total = pages.len();
        let first_width = pages[0].width();
        let split_lines = split_lines
            .map(|l| l.fit_to(first_width))
            .unwrap_or_else(|| SplitLines::for_width(first_width));
        info!(
            pages = total,
            jobs = self.options.jobs.max(1),
            engine = self.adapter.engine_name(),
            "Starting batch"
        );

        let mut slots: Vec<Option<OcrResult>> = vec![None; total];
        let mut tasks = JoinSet::new();
        let mut next = 0;
        let mut done = 0;
        let jobs = self.options.jobs.max(1);

        loop {
            while next < total && tasks.len() < jobs && !self.cancel.is_cancelled() {
                tasks.spawn(process_page(
                    next,
                    pages[next].clone(),
                    preprocessor.clone(),
                    self.adapter.clone(),
                    *params,
                    self.options.page_timeout,
                ));
                next += 1;
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            let (index, outcome) = joined.map_err(|e| Error::Worker(e.to_string()))?;
            let page = &pages[index];
            let result = match outcome {
                Ok(raw_text) => {
                    info!(page = %page.name, index, chars = raw_text.len(), "Page recognized");
                    OcrResult {
                        name: page.name.clone(),
                        normalized_text: self.normalizer.normalize(&raw_text),
                        raw_text,
                        warning: None,
                    }
                }
                Err(e) => {
                    warn!(page = %page.name, index, error = %e, "Page skipped");
                    OcrResult {
                        name: page.name.clone(),
                        warning: Some(e.to_string()),
                        ..Default::default()
                    }
                }
            };
            slots[index] = Some(result);

            done += 1;
            if let Some(progress) = &self.progress {
                progress(Progress { done, total });
            }
        }

        if done < total {
            // Keep only the unbroken run of finished pages from the start
            let finished: Vec<OcrResult> = slots.into_iter().map_while(|s| s).collect();
            info!(completed = done, kept = finished.len(), total, "Batch cancelled");
            return Err(Error::Cancelled {
                completed: done,
                total,
                partial: Box::new(self.assemble(finished, split_lines)),
            });
        }

        Ok(self.assemble(slots.into_iter().flatten().collect(), split_lines))
    }

    /// Join page texts in order and normalize the whole once
    fn assemble(&self, results: Vec<OcrResult>, split_lines: SplitLines) -> BatchOutput {
        let raw_combined = results
            .iter()
            .map(|r| r.raw_text.as_str())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);
        let normalized_combined = self.normalizer.normalize(&raw_combined);
        debug!(
            raw_chars = raw_combined.len(),
            normalized_chars = normalized_combined.len(),
            "Batch text assembled"
        );

        BatchOutput {
            pages: results,
            split_lines: Some(split_lines),
            raw_combined,
            normalized_combined,
        }
    }
}

async fn process_page(
    index: usize,
    page: PageImage,
    preprocessor: Preprocessor,
    adapter: RecognitionAdapter,
    params: PreprocessParameters,
    timeout: Option<Duration>,
) -> (usize, Result<String>) {
    let work = tokio::task::spawn_blocking(move || {
        let binary = preprocessor.preprocess_page(&page)?;
        adapter.recognize(&binary, &params)
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(joined) => joined,
            Err(_) => {
                return (
                    index,
                    Err(Error::RecognitionUnavailable(format!(
                        "timed out after {:?}",
                        limit
                    ))),
                );
            }
        },
        None => work.await,
    };

    let outcome = joined.unwrap_or_else(|e| {
        Err(Error::RecognitionUnavailable(format!(
            "recognition worker failed: {}",
            e
        )))
    });
    (index, outcome)
}
