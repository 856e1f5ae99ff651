//! End-to-end scenario tests for the crawl/enrichment engine, covering the
//! walkthroughs a fresh land owner would hit: a first crawl, an archive
//! fallback, mid-wave cancellation, rerun idempotence, and dictionary
//! mutation. Each spins up a tiny local `axum` server to stand in for the
//! crawled site, the same sandbox-server pattern the teacher uses for its
//! anti-bot HITL test.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use landcrawl_engine::adapters::{ArchiveAdapter, ArchiveSnapshot, MockArchiveAdapter};
use landcrawl_engine::config::{ExtractorConfig, FetcherConfig, HeuristicsConfig, RetryPolicy};
use landcrawl_engine::extractor::{ContentExtractor, DiscoveredLink};
use landcrawl_engine::fetcher::{FetchOpts, Fetcher};
use landcrawl_engine::lemma;
use landcrawl_engine::linkgraph::LinkGraphExpander;
use landcrawl_engine::model::{Domain, Expression, ExpressionPatch, JobCounters, JobStatus, Land, LandCrawlStatus};
use landcrawl_engine::persist::{InMemoryPersister, Persister};
use landcrawl_engine::scheduler::pipeline::{CandidateHandler, CandidateOutcome, JobRunner};
use landcrawl_engine::scheduler::pipelines::{run_crawl_job, ConsolidateHandler, CrawlCandidateHandler};
use landcrawl_engine::scheduler::progress::{PersistGate, ProgressChannel};

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

fn serve(listener: TcpListener, router: Router) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    })
}

fn page(title: &str, body_extra: &str, links: &[&str]) -> String {
    let anchors: String = links.iter().map(|l| format!("<a href=\"{l}\">{l}</a>")).collect();
    format!(
        "<html><head><title>{title}</title><meta name=\"description\" content=\"about {title}\"></head><body><p>{}{}</p>{anchors}</body></html>",
        "lecornu macron policy ".repeat(40),
        body_extra,
    )
}

fn new_land(keywords: &[&str]) -> Land {
    let mut land = Land::new(Uuid::new_v4(), "test-land");
    land.keywords = keywords.iter().map(|k| k.to_string()).collect();
    land.languages = vec!["en".to_string()];
    land.crawl_status = LandCrawlStatus::Idle;
    land
}

fn crawl_handler(
    persister: Arc<InMemoryPersister>,
    dictionary: landcrawl_engine::model::LandDictionary,
    archive: Option<Arc<dyn ArchiveAdapter>>,
) -> Arc<CrawlCandidateHandler> {
    let fetcher_cfg = FetcherConfig { timeout_ms: 2000, retry_attempts: 2, backoff_base_ms: 10, ..Default::default() };
    let fetcher = Arc::new(Fetcher::new(&fetcher_cfg, RetryPolicy::default()).unwrap());
    let extractor = Arc::new(ContentExtractor::new(
        ExtractorConfig { min_readable_chars: 50, ..Default::default() },
        archive,
    ));
    let expander = Arc::new(LinkGraphExpander::new(persister.clone(), HeuristicsConfig { rules: HashMap::new() }, vec![]));
    Arc::new(CrawlCandidateHandler {
        fetcher,
        extractor,
        persister,
        expander,
        dictionary,
        depth_limit: 2,
        fetch_opts: FetchOpts::from(&fetcher_cfg),
    })
}

/// S1 — fresh crawl, one seed, depth 1: seed links to a same-site page and
/// an external page; the same-site child links back to the seed.
#[tokio::test]
async fn s1_fresh_crawl_one_seed_depth_one() {
    let (listener, addr) = bind().await;
    let seed_url = format!("http://{addr}/a");
    let child_url = format!("http://{addr}/b");

    let router = Router::new()
        .route(
            "/a",
            get({
                let child_url = child_url.clone();
                move || async move { Html(page("Seed", "", &[&child_url, "https://external.example/x"])) }
            }),
        )
        .route(
            "/b",
            get({
                let seed_url = seed_url.clone();
                move || async move { Html(page("Child", "", &[&seed_url])) }
            }),
        );
    let _server = serve(listener, router);

    let land = new_land(&["lecornu", "macron"]);
    let land_id = land.id;
    let persister = Arc::new(InMemoryPersister::new());
    persister.seed_land(land.clone());

    let domain = persister.upsert_domain(Domain::new(land_id, addr.to_string())).await.unwrap();
    let seed = Expression::new_candidate(land_id, domain.id, seed_url.clone(), 0);
    persister.upsert_expression(seed).await.unwrap();

    let dictionary = lemma::dictionary::build(&land.keywords, "en");
    let h = crawl_handler(persister.clone(), dictionary, None);

    let (status, counters) =
        run_crawl_job(Uuid::new_v4(), land_id, 1, 10, 4, 50, 30_000, h, CancellationToken::new()).await;

    assert_eq!(status, JobStatus::Succeeded);
    assert_eq!(counters.ok, 2, "seed + same-site child extract cleanly");
    assert_eq!(counters.failed, 1, "external stub has no archive adapter and no fetchable body, so extraction is unusable");

    let all = persister.candidates(land_id, u32::MAX, 100).await.unwrap();
    assert_eq!(all.len(), 0, "every discovered row reached a terminal outcome and is no longer a candidate");
}

/// S3 — archive fallback: the live fetch 404s, the archive adapter returns
/// a usable snapshot, and the row is approved with `source="archive"`.
#[tokio::test]
async fn s3_archive_fallback_on_404() {
    let (listener, addr) = bind().await;
    let router = Router::new().route("/missing", get(|| async { (axum::http::StatusCode::NOT_FOUND, "") }));
    let _server = serve(listener, router);
    let url = format!("http://{addr}/missing");

    let land = new_land(&["lecornu"]);
    let land_id = land.id;
    let persister = Arc::new(InMemoryPersister::new());
    persister.seed_land(land.clone());
    let domain = persister.upsert_domain(Domain::new(land_id, addr.to_string())).await.unwrap();
    let seed = Expression::new_candidate(land_id, domain.id, url.clone(), 0);
    let seed_id = seed.id;
    persister.upsert_expression(seed).await.unwrap();

    let snapshot = ArchiveSnapshot {
        snapshot_url: format!("{url}?archived=1"),
        fetched_at: chrono::Utc::now(),
        body: page("Archived copy", &"lecornu ".repeat(60), &[]).into_bytes(),
    };
    let archive: Arc<dyn ArchiveAdapter> = Arc::new(MockArchiveAdapter::with_snapshot(snapshot));

    let dictionary = lemma::dictionary::build(&land.keywords, "en");
    let h = crawl_handler(persister.clone(), dictionary, Some(archive));

    let (status, counters) =
        run_crawl_job(Uuid::new_v4(), land_id, 0, 10, 2, 50, 30_000, h, CancellationToken::new()).await;
    assert_eq!(status, JobStatus::Succeeded);
    assert_eq!(counters.ok, 1);

    let row = persister.get_expression(seed_id).await.unwrap();
    assert_eq!(row.extraction_source.as_deref(), Some("archive"));
    assert!(row.approved_at.is_some());
    assert!(row.readable.is_some());
}

/// S4 — cancellation mid-wave: cancel fires after a handful of candidates
/// complete; the job ends `Cancelled` and the rest stay unapproved.
#[tokio::test]
async fn s4_cancellation_mid_wave_leaves_remaining_candidates_unapproved() {
    let land = new_land(&["lecornu"]);
    let land_id = land.id;
    let persister = Arc::new(InMemoryPersister::new());
    persister.seed_land(land.clone());
    let domain = persister.upsert_domain(Domain::new(land_id, "example.test")).await.unwrap();

    struct SlowThenBlockHandler {
        completed: Arc<AtomicU32>,
        cancel_after: u32,
        persister: Arc<InMemoryPersister>,
    }

    #[async_trait::async_trait]
    impl CandidateHandler for SlowThenBlockHandler {
        async fn handle(&self, candidate: Expression, cancel: &CancellationToken) -> CandidateOutcome {
            let n = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
            if n > self.cancel_after {
                cancel.cancel();
            }
            let patch = ExpressionPatch { http_status: Some(200), readable: Some("ok".to_string()), terminal: true, ..Default::default() };
            let _ = self.persister.record_crawl_outcome(candidate.id, patch).await;
            CandidateOutcome::Ok
        }
    }

    let mut seeded = 0u64;
    for i in 0..50 {
        let expr = Expression::new_candidate(land_id, domain.id, format!("https://example.test/{i}"), 0);
        persister.upsert_expression(expr).await.unwrap();
        seeded += 1;
    }

    let cancel = CancellationToken::new();
    let handler = Arc::new(SlowThenBlockHandler { completed: Arc::new(AtomicU32::new(0)), cancel_after: 10, persister: persister.clone() });
    let progress = ProgressChannel::new(Uuid::new_v4());
    let gate = PersistGate::new(std::time::Duration::from_millis(10));
    let runner = JobRunner::new(8);
    let mut counters = JobCounters::default();
    let candidates = persister.candidates(land_id, 0, 100).await.unwrap();
    counters.selected = candidates.len() as u64;

    let dyn_persister: Arc<dyn Persister> = persister.clone();
    runner
        .run_wave(
            Uuid::new_v4(),
            0,
            candidates,
            handler,
            &progress,
            &gate,
            &mut counters,
            &cancel,
            &dyn_persister,
            std::time::Duration::from_secs(30),
        )
        .await;

    assert!(cancel.is_cancelled());
    assert!(counters.ok >= 10, "at least cancel_after candidates should have completed: {}", counters.ok);

    let remaining_unapproved = persister.candidates(land_id, 0, 1000).await.unwrap().len() as u64;
    assert_eq!(remaining_unapproved, seeded - counters.ok, "everything not completed is still a candidate");
}

/// S5 — link-graph idempotence: expanding the same discovered links twice
/// from different sources creates no duplicate Expressions or edges.
#[tokio::test]
async fn s5_link_graph_expansion_is_idempotent_across_reruns() {
    let persister = Arc::new(InMemoryPersister::new());
    let expander = LinkGraphExpander::new(persister.clone(), HeuristicsConfig { rules: HashMap::new() }, vec![]);
    let land_id = Uuid::new_v4();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    let links = vec![DiscoveredLink { url: "https://example.com/a".to_string(), anchor_text: None }];
    let first_run = expander.expand(land_id, a, 0, &links, 2).await.unwrap();
    assert_eq!(first_run.len(), 1);

    // Same link rediscovered from a different source: only an edge is added.
    let second_run = expander.expand(land_id, b, 0, &links, 2).await.unwrap();
    assert!(second_run.is_empty());

    let all = persister.candidates(land_id, 2, 100).await.unwrap();
    assert_eq!(all.len(), 1, "no duplicate Expression was created on rediscovery");
}

/// S6 — dictionary mutation: after a crawl completes, adding a keyword and
/// running `consolidate` recomputes relevance without touching links/media.
#[tokio::test]
async fn s6_consolidate_recomputes_relevance_after_dictionary_mutation() {
    let persister = Arc::new(InMemoryPersister::new());
    let land_id = Uuid::new_v4();
    let domain_id = Uuid::new_v4();
    let mut expr = Expression::new_candidate(land_id, domain_id, "https://example.com/a", 0);
    expr.title = Some("Policy piece".to_string());
    expr.readable = Some("this article discusses lecornu and macron at length".to_string());
    let expr_id = expr.id;
    persister.upsert_expression(expr).await.unwrap();
    persister
        .record_crawl_outcome(expr_id, ExpressionPatch { http_status: Some(200), terminal: true, ..Default::default() })
        .await
        .unwrap();

    let before = persister.get_expression(expr_id).await.unwrap();
    assert_eq!(before.relevance, 0, "no dictionary was scored against yet");

    let dict = lemma::dictionary::build(&["lecornu".to_string(), "macron".to_string()], "en");
    let extractor = Arc::new(ContentExtractor::new(ExtractorConfig::default(), None));
    let expander = Arc::new(LinkGraphExpander::new(persister.clone(), HeuristicsConfig { rules: HashMap::new() }, vec![]));
    let consolidate = ConsolidateHandler { persister: persister.clone(), expander, extractor, dictionary: dict, depth_limit: 2 };

    let outcome = consolidate.handle(before.clone(), &CancellationToken::new()).await;
    assert_eq!(outcome, CandidateOutcome::Ok);

    let after = persister.get_expression(expr_id).await.unwrap();
    assert!(after.relevance > 0);
    assert_eq!(after.title, before.title, "unrelated fields are untouched by consolidation");
}

/// S2 (fetcher-level) — a transient failure exhausts the configured retry
/// budget and surfaces as a permanent `HttpError`; a later fetch against a
/// server that has since recovered succeeds.
#[tokio::test]
async fn s2_transient_failures_exhaust_retries_then_recover() {
    let failures_left = Arc::new(AtomicU32::new(2));
    let (listener, addr) = bind().await;
    let router = Router::new().route(
        "/flaky",
        get({
            let failures_left = failures_left.clone();
            move || {
                let failures_left = failures_left.clone();
                async move {
                    if failures_left.load(Ordering::SeqCst) > 0 {
                        failures_left.fetch_sub(1, Ordering::SeqCst);
                        (axum::http::StatusCode::SERVICE_UNAVAILABLE, "").into_response()
                    } else {
                        Html(page("Recovered", "", &[])).into_response()
                    }
                }
            }
        }),
    );
    let _server = serve(listener, router);
    let url = format!("http://{addr}/flaky");

    let cfg = FetcherConfig { retry_attempts: 1, backoff_base_ms: 5, timeout_ms: 2000, ..Default::default() };
    let fetcher = Fetcher::new(&cfg, RetryPolicy::default()).unwrap();
    let opts = FetchOpts::from(&cfg);
    let cancel = CancellationToken::new();

    // Only 1 attempt configured: the first 503 is permanent for this attempt.
    let first = fetcher.fetch(&url, &opts, &cancel).await;
    assert!(first.is_err(), "single-attempt fetch against a 503 must fail, not retry silently");

    // Simulates a later, separate job run against the same URL after the
    // upstream has recovered.
    failures_left.store(0, Ordering::SeqCst);
    let second = fetcher.fetch(&url, &opts, &cancel).await;
    assert!(second.is_ok());
}
