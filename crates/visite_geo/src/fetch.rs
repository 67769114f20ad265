use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use futures::future::{try_join, try_join_all};
use tracing::{debug, instrument};

use crate::{error::GeoError, marker::MarkerRecord};

/// Tag of one data set refresh. Later refreshes have larger generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Monotonic generation source, shareable between the task that starts a
/// refresh and the one applying its result.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn advance(&self) -> Generation {
        Generation(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn current(&self) -> Generation {
        Generation(self.current.load(Ordering::Acquire))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }

    /// Unwraps `tagged` if no refresh started after it was requested.
    pub fn accept<T>(&self, tagged: Tagged<T>) -> Option<T> {
        if self.is_current(tagged.generation) {
            Some(tagged.value)
        } else {
            debug!(
                "Discarding stale response {} (current {})",
                tagged.generation,
                self.current()
            );
            None
        }
    }
}

/// A value produced for a given generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<T> {
    pub generation: Generation,
    pub value: T,
}

impl<T> Tagged<T> {
    pub fn new(generation: Generation, value: T) -> Self {
        Self { generation, value }
    }
}

/// Anything that can hand out a batch of records.
pub trait RecordSource {
    type Payload;

    fn fetch_records(
        &self,
    ) -> impl Future<Output = Result<Vec<MarkerRecord<Self::Payload>>, GeoError>> + Send;
}

/// Fetches every source concurrently and concatenates the records in source
/// order. The first failing source fails the whole fetch.
#[instrument(skip_all, fields(sources = sources.len()))]
pub async fn fetch_all<S>(sources: &[S]) -> Result<Vec<MarkerRecord<S::Payload>>, GeoError>
where
    S: RecordSource,
{
    let batches = try_join_all(sources.iter().map(|source| source.fetch_records())).await?;
    let records: Vec<_> = batches.into_iter().flatten().collect();

    debug!("Fetched {} records", records.len());

    Ok(records)
}

/// Runs two independent requests concurrently, failing fast.
pub async fn fetch_pair<A, B, FA, FB>(first: FA, second: FB) -> Result<(A, B), GeoError>
where
    FA: Future<Output = Result<A, GeoError>>,
    FB: Future<Output = Result<B, GeoError>>,
{
    try_join(first, second).await
}

/// [`fetch_all`], tagged with the generation the fetch was started for.
#[instrument(skip_all, fields(generation = %generation))]
pub async fn fetch_tagged<S>(
    generation: Generation,
    sources: &[S],
) -> Result<Tagged<Vec<MarkerRecord<S::Payload>>>, GeoError>
where
    S: RecordSource,
{
    let records = fetch_all(sources).await?;
    Ok(Tagged::new(generation, records))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_utils::{self, StaticSource};

    #[test]
    fn test_generations_are_monotonic() {
        let counter = GenerationCounter::default();
        let first = counter.advance();
        let second = counter.clone().advance();

        assert!(second > first);
        assert!(counter.is_current(second));
        assert!(!counter.is_current(first));
    }

    #[test]
    fn test_stale_values_are_discarded() {
        let counter = GenerationCounter::default();
        let stale = counter.advance();
        let fresh = counter.advance();

        assert_eq!(counter.accept(Tagged::new(stale, 1)), None);
        assert_eq!(counter.accept(Tagged::new(fresh, 2)), Some(2));
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_source_order() {
        let sources = vec![
            StaticSource::ok(vec![test_utils::record(1, 1.0, 1.0)])
                .with_delay(Duration::from_millis(20)),
            StaticSource::ok(vec![
                test_utils::record(2, 2.0, 2.0),
                test_utils::record(3, 3.0, 3.0),
            ]),
        ];

        let records = fetch_all(&sources).await.unwrap();
        let ids: Vec<_> = records
            .iter()
            .map(|record| record.payload["id"].as_u64().unwrap())
            .collect();

        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_one_failing_source_fails_the_fetch() {
        let sources = vec![
            StaticSource::ok(vec![test_utils::record(1, 1.0, 1.0)]),
            StaticSource::failing("images endpoint returned 500"),
        ];

        let result = fetch_all(&sources).await;

        assert_eq!(
            result.unwrap_err(),
            GeoError::UpstreamFetchFailure("images endpoint returned 500".to_string())
        );
    }

    #[tokio::test]
    async fn test_fetch_pair_joins_both() {
        let (records, images) = fetch_pair(
            async { Ok::<_, GeoError>(vec![test_utils::record(1, 1.0, 1.0)]) },
            async { Ok::<_, GeoError>(vec!["a.jpg".to_string()]) },
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(images, vec!["a.jpg"]);
    }

    #[tokio::test]
    async fn test_fetch_tagged() {
        let counter = GenerationCounter::default();
        let generation = counter.advance();
        let sources = vec![StaticSource::ok(vec![test_utils::record(1, 1.0, 1.0)])];

        let tagged = fetch_tagged(generation, &sources).await.unwrap();

        assert_eq!(tagged.generation, generation);
        assert_eq!(counter.accept(tagged).unwrap().len(), 1);
    }
}
