use crate::article::ArticleRef;
use crate::error::ScanError;
use crate::graph::LinkGraph;
use crate::links::LinkExtractor;
use crate::page::Document;
use crate::source::PageSource;
use futures::future::{BoxFuture, FutureExt, join_all};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Called before every fetch with `(depth_remaining, url)`.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// When a node enters the visited set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitPolicy {
    /// Expand level by level and claim a link the first time a level sees
    /// it. Later links to it still add an edge but never trigger another
    /// expansion. Every fetch of one level runs concurrently.
    #[default]
    OnDiscovery,
    /// Mark a node only after its own expansion finished and skip links to
    /// marked nodes without recording the edge. Sequential; a node reachable
    /// through several open branches is fetched once per arrival.
    AfterExpansion,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedPage {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub graph: LinkGraph,
    pub failures: Vec<FailedPage>,
    pub fetches: usize,
    /// Deadline or cancellation cut the build short.
    pub interrupted: bool,
}

pub struct GraphBuilder {
    source: Arc<dyn PageSource>,
    extractor: LinkExtractor,
    max_depth: usize,
    workers: usize,
    policy: VisitPolicy,
    fetch_timeout: Option<Duration>,
    deadline: Option<Duration>,
    cancel: CancellationToken,
    progress_callback: Option<ProgressCallback>,
}

#[derive(Clone)]
struct TraversalState {
    graph: LinkGraph,
    visited: HashSet<ArticleRef>,
    failures: Vec<FailedPage>,
    fetches: usize,
    interrupted: bool,
}

struct TraversalContext {
    source: Arc<dyn PageSource>,
    extractor: LinkExtractor,
    state: Mutex<TraversalState>,
    permits: Semaphore,
    cancel: CancellationToken,
    deadline: Option<Instant>,
    fetch_timeout: Option<Duration>,
    progress_callback: Option<ProgressCallback>,
}

impl GraphBuilder {
    pub fn new(source: Arc<dyn PageSource>, extractor: LinkExtractor) -> Self {
        Self {
            source,
            extractor,
            max_depth: 1,
            workers: 10,
            policy: VisitPolicy::default(),
            fetch_timeout: None,
            deadline: None,
            cancel: CancellationToken::new(),
            progress_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn set_max_depth(&mut self, depth: usize) {
        self.max_depth = depth;
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_visit_policy(mut self, policy: VisitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Overall time budget for one build, counted from the start of `build`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub async fn build(&self, seed: ArticleRef) -> BuildOutcome {
        info!(
            "Starting graph build of {} to depth {} ({:?}, {} workers)",
            seed, self.max_depth, self.policy, self.workers
        );

        let mut visited = HashSet::new();
        if self.policy == VisitPolicy::OnDiscovery {
            visited.insert(seed.clone());
        }

        let ctx = Arc::new(TraversalContext {
            source: self.source.clone(),
            extractor: self.extractor.clone(),
            state: Mutex::new(TraversalState {
                graph: LinkGraph::new(seed.clone()),
                visited,
                failures: Vec::new(),
                fetches: 0,
                interrupted: false,
            }),
            permits: Semaphore::new(self.workers),
            cancel: self.cancel.clone(),
            deadline: self.deadline.map(|d| Instant::now() + d),
            fetch_timeout: self.fetch_timeout,
            progress_callback: self.progress_callback.clone(),
        });

        match self.policy {
            VisitPolicy::OnDiscovery => expand_by_level(&ctx, seed, self.max_depth).await,
            VisitPolicy::AfterExpansion => {
                expand_after(ctx.clone(), seed, self.max_depth).await
            }
        }

        let state = match Arc::try_unwrap(ctx) {
            Ok(ctx) => ctx.state.into_inner(),
            Err(ctx) => ctx.state.lock().await.clone(),
        };

        info!(
            "Graph build complete. {} nodes, {} edges, {} fetches, {} failures",
            state.graph.node_count(),
            state.graph.edge_count(),
            state.fetches,
            state.failures.len()
        );

        BuildOutcome {
            graph: state.graph,
            failures: state.failures,
            fetches: state.fetches,
            interrupted: state.interrupted,
        }
    }
}

/// Expands the graph one level at a time. A node is claimed at the shallowest
/// level that reaches it, so it keeps the most depth it can have left no
/// matter which fetch of the previous level returned first.
async fn expand_by_level(ctx: &TraversalContext, seed: ArticleRef, max_depth: usize) {
    let mut frontier = vec![seed];

    for depth in (1..=max_depth).rev() {
        if frontier.is_empty() {
            break;
        }
        if ctx.stopped() {
            ctx.state.lock().await.interrupted = true;
            break;
        }
        debug!("Expanding {} articles with depth {} left", frontier.len(), depth);

        let pages = join_all(frontier.iter().map(|node| ctx.outgoing_links(node, depth))).await;

        let mut state = ctx.state.lock().await;
        let mut next = Vec::new();
        for (node, links) in frontier.iter().zip(pages) {
            let Some(links) = links else {
                continue;
            };
            for link in links {
                state.graph.add_edge(node, &link);
                if state.visited.insert(link.clone()) {
                    next.push(link);
                } else {
                    debug!("Already claimed {}", link);
                }
            }
        }
        frontier = next;
    }
}

fn expand_after(
    ctx: Arc<TraversalContext>,
    node: ArticleRef,
    depth: usize,
) -> BoxFuture<'static, ()> {
    async move {
        if depth == 0 {
            return;
        }
        let Some(links) = ctx.outgoing_links(&node, depth).await else {
            return;
        };

        let total = links.len();
        for (idx, link) in links.into_iter().enumerate() {
            {
                let mut state = ctx.state.lock().await;
                if state.visited.contains(&link) {
                    debug!("Skipping visited {}", link);
                    continue;
                }
                state.graph.add_edge(&node, &link);
            }
            debug!("Following sublink {}/{} at depth {}: {}", idx + 1, total, depth, link);
            expand_after(ctx.clone(), link, depth - 1).await;
        }

        ctx.state.lock().await.visited.insert(node);
    }
    .boxed()
}

impl TraversalContext {
    /// Fetches `node` and extracts its article links. `None` leaves the node
    /// as a leaf, either because it failed or because the build was stopped.
    async fn outgoing_links(&self, node: &ArticleRef, depth: usize) -> Option<Vec<ArticleRef>> {
        let document = match self.fetch(node, depth).await {
            Ok(doc) => doc,
            Err(Some(e)) => {
                self.record_failure(node, e).await;
                return None;
            }
            Err(None) => {
                self.state.lock().await.interrupted = true;
                return None;
            }
        };

        match self.extractor.extract(&document) {
            Ok(links) => Some(links),
            Err(e) => {
                self.record_failure(node, e).await;
                None
            }
        }
    }

    /// `Err(None)` means the build was stopped before or during the fetch.
    async fn fetch(
        &self,
        node: &ArticleRef,
        depth: usize,
    ) -> std::result::Result<Arc<Document>, Option<ScanError>> {
        if self.stopped() {
            return Err(None);
        }

        let _permit = tokio::select! {
            _ = self.cancel.cancelled() => return Err(None),
            permit = self.permits.acquire() => permit.map_err(|e| Some(ScanError::Other(e.to_string())))?,
        };
        if self.stopped() {
            return Err(None);
        }

        if let Some(ref callback) = self.progress_callback {
            callback(depth, node.url().to_string());
        }
        self.state.lock().await.fetches += 1;

        let url = node.url();
        let limited = async {
            match self.time_limit() {
                Some(limit) => tokio::time::timeout(limit, self.source.fetch(url))
                    .await
                    .unwrap_or_else(|_| {
                        Err(ScanError::Timeout {
                            url: url.to_string(),
                        })
                    }),
                None => self.source.fetch(url).await,
            }
        };

        let result = tokio::select! {
            _ = self.cancel.cancelled() => return Err(None),
            result = limited => result,
        };

        match result {
            Ok(doc) => Ok(doc),
            Err(ScanError::Timeout { .. }) if self.deadline_passed() => Err(None),
            Err(e) => Err(Some(e)),
        }
    }

    async fn record_failure(&self, node: &ArticleRef, error: ScanError) {
        warn!("Crawl error for {}: {}", node, error);
        self.state.lock().await.failures.push(FailedPage {
            url: node.url().to_string(),
            error: error.to_string(),
        });
    }

    fn time_limit(&self) -> Option<Duration> {
        let remaining = self
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()));
        match (self.fetch_timeout, remaining) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline_passed()
    }
}
