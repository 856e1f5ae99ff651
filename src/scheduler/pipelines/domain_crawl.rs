//! Domain-crawl pipeline (spec §4.10): fetches each Domain's home page and
//! refreshes its title/description/http_status. Operates over `Domain`
//! rows directly rather than `Expression` candidates, so it doesn't fit the
//! `CandidateHandler`/`JobRunner` envelope the other side pipelines share.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::extractor::ContentExtractor;
use crate::fetcher::{FetchOpts, Fetcher};
use crate::model::Domain;
use crate::persist::Persister;

pub struct DomainCrawlRunner {
    pub fetcher: Arc<Fetcher>,
    pub extractor: Arc<ContentExtractor>,
    pub persister: Arc<dyn Persister>,
    pub fetch_opts: FetchOpts,
    pub concurrency: usize,
}

impl DomainCrawlRunner {
    pub async fn run(&self, land_id: Uuid, cancel: &CancellationToken) -> (u64, u64) {
        let domains = match self.persister.domains(land_id).await {
            Ok(d) => d,
            Err(_) => return (0, 0),
        };

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let (mut ok, mut failed) = (0u64, 0u64);

        for domain in domains {
            if cancel.is_cancelled() {
                break;
            }
            let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
            let fetcher = self.fetcher.clone();
            let extractor = self.extractor.clone();
            let persister = self.persister.clone();
            let fetch_opts = self.fetch_opts.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = permit;
                refresh_one(domain, &fetcher, &extractor, persister.as_ref(), &fetch_opts, &cancel).await
            });
        }

        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(true) => ok += 1,
                _ => failed += 1,
            }
        }
        (ok, failed)
    }
}

async fn refresh_one(
    domain: Domain,
    fetcher: &Fetcher,
    extractor: &ContentExtractor,
    persister: &dyn Persister,
    fetch_opts: &FetchOpts,
    cancel: &CancellationToken,
) -> bool {
    let home_url = format!("https://{}/", domain.name);
    let Ok(fetch_result) = fetcher.fetch(&home_url, fetch_opts, cancel).await else {
        return false;
    };
    let mut updated = domain;
    updated.http_status = Some(fetch_result.http_status);
    updated.last_fetched_at = Some(chrono::Utc::now());
    updated.updated_at = chrono::Utc::now();

    if let Ok(content) = extractor.extract(&home_url, Some(&fetch_result)).await {
        updated.title = content.title;
        updated.description = content.description;
    }

    persister.upsert_domain(updated).await.is_ok()
}
