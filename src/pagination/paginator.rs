//! Concurrent offset paginator
//!
//! A single governing loop hands out `$skip` offsets in increasing order,
//! one per idle slot and rate permit. Each dispatch unit fetches its page,
//! merges the records into the shared aggregate, then either recycles its
//! slot (more pages) or retires it and signals exhaustion (last page).
//!
//! A slot only becomes available again after its unit has merged its
//! records and decided whether to continue, so the number of pages in
//! flight never exceeds the slot count.

use super::slots::{SlotLease, SlotPool};
use super::types::{
    AggregateResult, DispatchUnit, PageFetcher, PageRequest, PageResult, PaginatorConfig,
    RunStats,
};
use crate::error::{Error, Result};
use crate::http::RateLimiter;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Records and cursors merged so far in one run
struct Aggregate<R> {
    records: Vec<R>,
    seen_cursors: HashSet<String>,
    pages: usize,
}

impl<R> Default for Aggregate<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            seen_cursors: HashSet::new(),
            pages: 0,
        }
    }
}

/// What the governing loop observed next
enum Step {
    Cancelled,
    Exhausted,
    Joined(std::result::Result<Result<()>, JoinError>),
    Slot(SlotLease),
}

/// Fetches every page of a collection using a fixed number of slots
pub struct Paginator<F> {
    fetcher: Arc<F>,
    config: PaginatorConfig,
    limiter: Option<RateLimiter>,
}

impl<F> std::fmt::Debug for Paginator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl<F: PageFetcher + 'static> Paginator<F> {
    /// Create a paginator with the default configuration
    pub fn new(fetcher: F) -> Result<Self> {
        Self::with_config(fetcher, PaginatorConfig::default())
    }

    /// Create a paginator with a custom configuration
    pub fn with_config(fetcher: F, config: PaginatorConfig) -> Result<Self> {
        config.validate()?;
        let limiter = config
            .rate_limit
            .as_ref()
            .map(|rate_limit| RateLimiter::new(rate_limit, config.slots))
            .transpose()?;

        Ok(Self {
            fetcher: Arc::new(fetcher),
            config,
            limiter,
        })
    }

    /// Fetch every page matching `template`
    ///
    /// `since` becomes the `CreateDateUtc` lower bound of every request;
    /// `None` fetches regardless of creation date.
    pub async fn run(
        &self,
        template: &PageRequest,
        since: Option<NaiveDate>,
    ) -> Result<AggregateResult<F::Record>> {
        self.run_until_cancelled(template, since, CancellationToken::new())
            .await
    }

    /// Like [`Paginator::run`], stopping early with [`Error::Cancelled`]
    /// once `cancel` fires
    ///
    /// Units already in flight finish before this returns; their records
    /// are discarded.
    pub async fn run_until_cancelled(
        &self,
        template: &PageRequest,
        since: Option<NaiveDate>,
        cancel: CancellationToken,
    ) -> Result<AggregateResult<F::Record>> {
        let mut pool = SlotPool::new(self.config.slots)?;
        let result = self.drive(&mut pool, template, since, &cancel).await;
        pool.close();
        result
    }

    /// Governing loop over a caller-supplied pool
    ///
    /// On return every unit has been joined, so all non-retired slots are
    /// back in `pool`.
    pub(crate) async fn drive(
        &self,
        pool: &mut SlotPool,
        template: &PageRequest,
        since: Option<NaiveDate>,
        cancel: &CancellationToken,
    ) -> Result<AggregateResult<F::Record>> {
        template.validate()?;

        let started = Instant::now();
        let template = Arc::new(template.clone());
        let shared = Arc::new(Mutex::new(Aggregate::default()));
        let exhausted = CancellationToken::new();
        let mut units: JoinSet<Result<()>> = JoinSet::new();
        let mut next_offset = template.offset;
        let mut dispatched = 0usize;

        info!(
            "Starting pagination: {} slots, page size {}, since {:?}",
            pool.size(),
            self.config.page_size,
            since
        );

        let outcome: Result<()> = loop {
            let step = tokio::select! {
                biased;
                () = cancel.cancelled() => Step::Cancelled,
                () = exhausted.cancelled() => Step::Exhausted,
                Some(joined) = units.join_next(), if !units.is_empty() => Step::Joined(joined),
                lease = pool.acquire() => match lease {
                    Some(lease) => Step::Slot(lease),
                    None => Step::Exhausted,
                },
            };

            let lease = match step {
                Step::Cancelled => break Err(Error::Cancelled),
                Step::Exhausted => break Ok(()),
                Step::Joined(joined) => match flatten(joined) {
                    Ok(()) => continue,
                    Err(e) => break Err(e),
                },
                Step::Slot(lease) => lease,
            };

            if let Some(limiter) = &self.limiter {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break Err(Error::Cancelled),
                    () = exhausted.cancelled() => break Ok(()),
                    () = limiter.wait() => {}
                }
            }
            if exhausted.is_cancelled() {
                break Ok(());
            }

            let unit = DispatchUnit {
                slot: lease.id(),
                offset: next_offset,
                since,
            };
            debug!("Dispatching offset {} on slot {}", unit.offset, unit.slot);
            units.spawn(run_unit(
                Arc::clone(&self.fetcher),
                Arc::clone(&template),
                unit,
                lease,
                Arc::clone(&shared),
                exhausted.clone(),
            ));
            next_offset += self.config.page_size;
            dispatched += 1;
        };

        let outcome = match outcome {
            Ok(()) => join_all(&mut units).await,
            Err(Error::Cancelled) => {
                debug!("Run cancelled, draining {} in-flight units", units.len());
                while units.join_next().await.is_some() {}
                Err(Error::Cancelled)
            }
            Err(e) => {
                units.abort_all();
                while units.join_next().await.is_some() {}
                Err(e)
            }
        };

        if let Err(e) = outcome {
            warn!("Pagination failed after {} dispatches: {}", dispatched, e);
            return Err(e);
        }

        let aggregate = std::mem::take(&mut *shared.lock().await);
        let stats = RunStats {
            pages_fetched: aggregate.pages,
            records: aggregate.records.len(),
            dispatched,
            slots: pool.size(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            "Pagination complete: {} records from {} pages in {}ms",
            stats.records, stats.pages_fetched, stats.duration_ms
        );

        Ok(AggregateResult {
            records: aggregate.records,
            stats,
        })
    }
}

/// Fetch one page, merge it, then recycle or retire the slot
async fn run_unit<F: PageFetcher>(
    fetcher: Arc<F>,
    template: Arc<PageRequest>,
    unit: DispatchUnit,
    lease: SlotLease,
    shared: Arc<Mutex<Aggregate<F::Record>>>,
    exhausted: CancellationToken,
) -> Result<()> {
    let request = template.at(unit.offset, unit.since);
    let PageResult {
        records,
        next_cursor,
    } = fetcher.fetch(&request).await.inspect_err(|e| {
        warn!("Fetch at offset {} on slot {} failed: {}", unit.offset, unit.slot, e);
    })?;

    let count = records.len();
    {
        let mut aggregate = shared.lock().await;
        if let Some(cursor) = &next_cursor {
            if !aggregate.seen_cursors.insert(cursor.clone()) {
                return Err(Error::RepeatedCursor {
                    cursor: cursor.clone(),
                    offset: unit.offset,
                });
            }
        }
        aggregate.records.extend(records);
        aggregate.pages += 1;
    }

    if next_cursor.is_some() {
        debug!(
            "Merged {} records from offset {}, slot {} recycled",
            count, unit.offset, unit.slot
        );
        lease.recycle();
    } else {
        debug!(
            "Last page at offset {} ({} records), slot {} retired",
            unit.offset, count, unit.slot
        );
        lease.retire();
        exhausted.cancel();
    }

    Ok(())
}

/// Join every remaining unit, aborting the rest on the first failure
async fn join_all(units: &mut JoinSet<Result<()>>) -> Result<()> {
    while let Some(joined) = units.join_next().await {
        if let Err(e) = flatten(joined) {
            units.abort_all();
            while units.join_next().await.is_some() {}
            return Err(e);
        }
    }
    Ok(())
}

fn flatten(joined: std::result::Result<Result<()>, JoinError>) -> Result<()> {
    joined.map_err(|e| Error::worker(e.to_string()))?
}
