//! Proximity query worker: a dedicated thread running a current-thread tokio
//! runtime. Requests go in over a tokio channel, responses come back to the
//! render thread over crossbeam and are drained without blocking.

use crossbeam_channel::{Receiver, Sender};
use songscape::candidate::{parse_candidates, Candidate};
use songscape::{QueryError, QueryRequest, QueryResponse};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `GET {base}/i?x=..&y=..&k=..`
pub fn query_url(api_base: &str, req: &QueryRequest) -> String {
    format!(
        "{}/i?x={}&y={}&k={}",
        api_base.trim_end_matches('/'),
        req.x,
        req.y,
        req.k
    )
}

pub struct QueryWorker {
    tx: Option<mpsc::UnboundedSender<QueryRequest>>,
    rx: Receiver<QueryResponse>,
    handle: Option<thread::JoinHandle<()>>,
}

impl QueryWorker {
    pub fn spawn(api_base: String) -> anyhow::Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()?;
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = crossbeam_channel::unbounded();

        let handle = thread::Builder::new()
            .name("songscape-query".into())
            .spawn(move || {
                rt.block_on(run_query_loop(client, api_base, req_rx, resp_tx));
                log::debug!("Query worker stopped");
            })?;

        Ok(Self {
            tx: Some(req_tx),
            rx: resp_rx,
            handle: Some(handle),
        })
    }

    pub fn submit(&self, req: QueryRequest) {
        let sent = self.tx.as_ref().map(|tx| tx.send(req).is_ok());
        if sent != Some(true) {
            log::debug!("Query worker gone, dropping request seq={}", req.seq);
        }
    }

    pub fn try_iter(&self) -> crossbeam_channel::TryIter<'_, QueryResponse> {
        self.rx.try_iter()
    }

    /// Closes the request channel and waits for the worker to exit.
    /// In-flight requests are abandoned.
    pub fn shutdown(&mut self) {
        self.tx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Query worker panicked");
            }
        }
    }
}

impl Drop for QueryWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_query_loop(
    client: reqwest::Client,
    api_base: String,
    mut requests: mpsc::UnboundedReceiver<QueryRequest>,
    responses: Sender<QueryResponse>,
) {
    while let Some(req) = requests.recv().await {
        let client = client.clone();
        let url = query_url(&api_base, &req);
        let responses = responses.clone();
        // Requests overlap; the session keeps only the newest response.
        tokio::spawn(async move {
            log::debug!("Proximity query seq={} {}", req.seq, url);
            let result = fetch_candidates(&client, &url).await;
            deliver(&responses, QueryResponse {
                seq: req.seq,
                result,
            });
        });
    }
}

/// Returns `false` if the render thread is no longer listening.
fn deliver(responses: &Sender<QueryResponse>, response: QueryResponse) -> bool {
    let seq = response.seq;
    if responses.send(response).is_err() {
        log::debug!("Render thread gone, dropping proximity response seq={}", seq);
        return false;
    }
    true
}

async fn fetch_candidates(client: &reqwest::Client, url: &str) -> Result<Vec<Candidate>, QueryError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| QueryError::Transport(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(QueryError::Status(resp.status().as_u16()));
    }

    let body = resp
        .bytes()
        .await
        .map_err(|e| QueryError::Transport(e.to_string()))?;

    Ok(parse_candidates(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_url_carries_pointer_and_k() {
        let req = QueryRequest {
            seq: 3,
            x: 0.5,
            y: -1.0,
            k: 800,
        };
        assert_eq!(
            query_url("http://127.0.0.1:8000/", &req),
            "http://127.0.0.1:8000/i?x=0.5&y=-1&k=800"
        );
    }

    #[test]
    fn delivery_to_closed_channel_is_dropped() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let response = || QueryResponse { seq: 3, result: Ok(Vec::new()) };
        assert!(deliver(&tx, response()));
        assert_eq!(rx.try_recv().map(|r| r.seq).ok(), Some(3));
        drop(rx);
        assert!(!deliver(&tx, response()));
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut worker = QueryWorker::spawn("http://127.0.0.1:9".into()).unwrap();
        worker.shutdown();
        worker.shutdown();
        assert!(worker.try_iter().next().is_none());
    }
}
