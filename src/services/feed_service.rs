use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::config::{Config, RollbackPolicy};
use crate::dto::vacancy_dto::{FeedQuery, Page};
use crate::error::{Error, Result};
use crate::models::vacancy::Vacancy;
use crate::services::api_service::ApiClient;

type SharedLoad = Shared<BoxFuture<'static, std::result::Result<(), Arc<Error>>>>;
type InflightLoads = Arc<Mutex<HashMap<String, SharedLoad>>>;

/// What the presentation layer observes: the last loaded page, minus
/// optimistically liked cards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    envelope: Option<Page<Vacancy>>,
    query: Option<FeedQuery>,
    pending_likes: usize,
    generation: u64,
}

impl FeedSnapshot {
    pub fn is_loaded(&self) -> bool {
        self.envelope.is_some()
    }

    pub fn envelope(&self) -> Option<&Page<Vacancy>> {
        self.envelope.as_ref()
    }

    /// Cards in display order; empty until the first page arrives.
    pub fn vacancies(&self) -> &[Vacancy] {
        self.envelope
            .as_ref()
            .map(|page| page.results.as_slice())
            .unwrap_or_default()
    }

    pub fn active(&self) -> impl Iterator<Item = &Vacancy> {
        self.vacancies().iter().filter(|vacancy| vacancy.is_active)
    }

    pub fn query(&self) -> Option<&FeedQuery> {
        self.query.as_ref()
    }

    /// Bumped every time a load replaces the held page.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Approvals sent by `like` that have not resolved yet.
    pub fn pending_likes(&self) -> usize {
        self.pending_likes
    }
}

/// A like whose approval request runs in the background. Dropping the ticket
/// does not cancel the request.
#[derive(Debug)]
pub struct LikeTicket {
    vacancy: Vacancy,
    handle: JoinHandle<Result<()>>,
}

impl LikeTicket {
    pub fn vacancy(&self) -> &Vacancy {
        &self.vacancy
    }

    pub async fn outcome(self) -> Result<()> {
        self.handle.await?
    }
}

/// Single owner of the feed state. Clones share the same state.
#[derive(Clone)]
pub struct VacancyFeed {
    client: ApiClient,
    page_size: u32,
    rollback: RollbackPolicy,
    state: Arc<watch::Sender<FeedSnapshot>>,
    inflight: InflightLoads,
}

fn lock(inflight: &InflightLoads) -> MutexGuard<'_, HashMap<String, SharedLoad>> {
    inflight.lock().unwrap_or_else(PoisonError::into_inner)
}

impl VacancyFeed {
    pub fn new(client: ApiClient, config: &Config) -> Self {
        let (state, _) = watch::channel(FeedSnapshot::default());
        Self {
            client,
            page_size: config.page_size,
            rollback: config.like_rollback,
            state: Arc::new(state),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.state.subscribe()
    }

    /// Loads the first page with the configured page size.
    pub async fn refresh(&self) -> Result<FeedSnapshot> {
        self.load(1, self.page_size).await
    }

    pub async fn load(&self, page: u32, page_size: u32) -> Result<FeedSnapshot> {
        self.load_query(FeedQuery::new(page, page_size)).await
    }

    /// Fetches the page described by `query` and makes it the held snapshot.
    /// Concurrent calls for the same query share one request. On failure the
    /// previous snapshot stays untouched.
    #[instrument(skip(self), fields(path = %query.path()))]
    pub async fn load_query(&self, query: FeedQuery) -> Result<FeedSnapshot> {
        query.validate()?;
        let key = query.path();

        let shared = {
            let mut inflight = lock(&self.inflight);
            match inflight.get(&key) {
                Some(existing) => {
                    debug!("Joining in-flight feed request");
                    existing.clone()
                }
                None => {
                    let load = self.fetch_and_commit(query, key.clone()).boxed().shared();
                    inflight.insert(key, load.clone());
                    load
                }
            }
        };

        shared.await?;
        Ok(self.snapshot())
    }

    /// Follows the `next` cursor of the held page. `Ok(None)` on the last page.
    pub async fn load_next(&self) -> Result<Option<FeedSnapshot>> {
        let next = {
            let snapshot = self.state.borrow();
            match (&snapshot.envelope, &snapshot.query) {
                (Some(page), Some(query)) if page.next.is_some() => Some(query.next_page()),
                _ => None,
            }
        };

        match next {
            Some(query) => self.load_query(query).await.map(Some),
            None => Ok(None),
        }
    }

    fn fetch_and_commit(
        &self,
        query: FeedQuery,
        key: String,
    ) -> impl std::future::Future<Output = std::result::Result<(), Arc<Error>>> + Send + 'static
    {
        let client = self.client.clone();
        let state = self.state.clone();
        let inflight = self.inflight.clone();

        async move {
            let result = client.jobs(&query).await;
            let outcome = match result {
                Ok(mut page) => {
                    let limit = query.page_size as usize;
                    if page.results.len() > limit {
                        warn!(
                            received = page.results.len(),
                            limit, "Backend returned more results than requested, truncating"
                        );
                        page.results.truncate(limit);
                    }
                    info!(count = page.count, received = page.results.len(), "Feed page loaded");
                    state.send_modify(|snapshot| {
                        snapshot.envelope = Some(page);
                        snapshot.query = Some(query);
                        snapshot.generation += 1;
                    });
                    Ok(())
                }
                Err(err) => {
                    warn!(error = %err, "Feed page load failed");
                    Err(Arc::new(err))
                }
            };
            lock(&inflight).remove(&key);
            outcome
        }
    }

    /// Removes the last held card right away and sends its approval in the
    /// background. Returns `None` when there is nothing to like; in that case
    /// no request is made.
    ///
    /// Must be called from within a Tokio runtime.
    #[instrument(skip(self))]
    pub fn like(&self) -> Option<LikeTicket> {
        let mut liked = None;
        let mut generation = 0;
        self.state.send_if_modified(|snapshot| {
            generation = snapshot.generation;
            liked = snapshot
                .envelope
                .as_mut()
                .and_then(|page| page.results.pop());
            if liked.is_some() {
                snapshot.pending_likes += 1;
            }
            liked.is_some()
        });

        let vacancy = liked?;
        info!(vacancy_id = vacancy.id, "Vacancy liked, sending approval");

        let client = self.client.clone();
        let state = self.state.clone();
        let rollback = self.rollback;
        let liked = vacancy.clone();

        let handle = tokio::spawn(async move {
            let outcome = client.apply(liked.id).await;
            let restore = match &outcome {
                Ok(()) => None,
                Err(err) => {
                    warn!(vacancy_id = liked.id, error = %err, ?rollback, "Approval failed");
                    (rollback == RollbackPolicy::Restore).then_some(liked)
                }
            };
            state.send_modify(|snapshot| {
                snapshot.pending_likes = snapshot.pending_likes.saturating_sub(1);
                let Some(vacancy) = restore else { return };
                // only back into the page it was taken from, and never past its size
                if snapshot.generation != generation {
                    warn!(vacancy_id = vacancy.id, "Feed reloaded since the like, not restoring");
                    return;
                }
                let limit = snapshot.query.as_ref().map(|q| q.page_size as usize);
                if let Some(page) = snapshot.envelope.as_mut() {
                    let duplicate = page.results.iter().any(|held| held.id == vacancy.id);
                    let full = limit.is_some_and(|limit| page.results.len() >= limit);
                    if !duplicate && !full {
                        page.results.push(vacancy);
                    }
                }
            });
            outcome
        });

        Some(LikeTicket { vacancy, handle })
    }
}
