use crate::{
    extract::SnippetExtractor,
    rotation::{self, weekday_name, RotationState},
    Accumulator, BlobIoError, BlobStore, CapacityError, Config, PageFetcher, ScriptEvaluator,
};
use chrono::{DateTime, Datelike, FixedOffset};
use itertools::Itertools;
use scraper::Html;
use std::{error::Error, future::Future};
use tracing::{debug, error, info, instrument, warn};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What one successful invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub blob_name: String,
    pub rotated: bool,
    pub timestamp: String,
    pub bytes_written: usize,
}

pub struct JobRunner<F, E, S> {
    config: Config,
    extractor: SnippetExtractor,
    fetcher: F,
    evaluator: E,
    store: S,
}

impl<F, E, S> JobRunner<F, E, S>
where
    F: PageFetcher + Sync,
    E: ScriptEvaluator + Sync,
    S: BlobStore + Sync,
{
    pub fn new(config: Config, fetcher: F, evaluator: E, store: S) -> JobRunner<F, E, S> {
        let extractor = SnippetExtractor::new(config.xpath.as_str(), config.snippet_marker.as_str());
        JobRunner {
            config,
            extractor,
            fetcher,
            evaluator,
            store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch, extract, evaluate, then append one snapshot to the current
    /// document. The document is written at most once, and only after every
    /// earlier step succeeded.
    #[instrument(skip(self), fields(url = %self.config.url))]
    pub async fn run_once(&self, now: DateTime<FixedOffset>) -> Result<RunReport, CapacityError> {
        info!("Run started at {}", now.time());

        let html = self.fetcher.fetch(&self.config.url).await?;
        info!("Parsing the returned HTML...");
        let snippet = {
            let doc = Html::parse_document(&html);
            self.extractor.extract(&doc)?
        };
        debug!("Extracted {} bytes of script", snippet.len());

        let value = self.evaluator.evaluate(&snippet).await?;
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();

        let state_blob = self.config.state_blob.as_str();
        let seed = RotationState::seeded_from(&self.config);
        let mut state = self
            .blob(state_blob, RotationState::load(&self.store, state_blob, seed))
            .await?;
        let target = self
            .blob(
                state_blob,
                rotation::resolve_target(&self.store, &mut state, state_blob, now.date_naive()),
            )
            .await?;

        let existing = self
            .blob(&target.name, self.store.read(&target.name))
            .await?
            .unwrap_or_default();
        info!("Existing data size {}", existing.len());

        let doc = self.config.accumulator.append(&existing, &timestamp, &value)?;

        info!("Writing new data to {}... {}", target.name, value.len());
        self.blob(&target.name, self.store.write(&target.name, &doc))
            .await?;

        let today = weekday_name(now.weekday());
        if state.last_update_day.as_deref() != Some(today) {
            state.last_update_day = Some(today.to_string());
            if let Err(e) = self
                .blob(state_blob, state.save(&self.store, state_blob))
                .await
            {
                warn!("Snapshot stored but rotation state not updated: {}", error_chain(&e));
            }
        }

        info!("Done!");
        Ok(RunReport {
            blob_name: target.name,
            rotated: target.rotated,
            timestamp,
            bytes_written: doc.len(),
        })
    }

    /// Runs once and logs the outcome. Never fails.
    pub async fn run_and_log(&self, now: DateTime<FixedOffset>) -> Option<RunReport> {
        match self.run_once(now).await {
            Ok(report) => {
                info!(
                    "Stored snapshot {} in {} ({} bytes{})",
                    report.timestamp,
                    report.blob_name,
                    report.bytes_written,
                    if report.rotated { ", rotated" } else { "" }
                );
                Some(report)
            }
            Err(e) => {
                error!("Problem: {}", error_chain(&e));
                None
            }
        }
    }

    async fn blob<T, Fut>(&self, name: &str, op: Fut) -> Result<T, CapacityError>
    where
        Fut: Future<Output = Result<T, BlobIoError>>,
    {
        match tokio::time::timeout(self.config.blob_timeout, op).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(BlobIoError::Http(e))) if e.is_timeout() => {
                Err(CapacityError::BlobTimeout(name.to_string()))
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(CapacityError::BlobTimeout(name.to_string())),
        }
    }
}

pub fn error_chain(e: &(dyn Error + 'static)) -> String {
    std::iter::successors(Some(e), |&e| e.source()).join(": ")
}
