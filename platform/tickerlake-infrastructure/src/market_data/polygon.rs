use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tickerlake_domain::repositories::ticker_source::TickerSource;
use tickerlake_domain::value_objects::sync_report::FetchOutcome;
use tickerlake_domain::value_objects::ticker::TickerRecord;
use url::Url;

const TICKERS_PATH: &str = "/v3/reference/tickers";
const SUCCESS_STATUS: &str = "OK";
const BODY_SNIPPET_LEN: usize = 256;

/// Client for the reference-ticker endpoint. Follows server-provided
/// pagination until exhausted, pausing between pages to respect the
/// provider's rate limit.
pub struct PolygonClient {
    api_key: String,
    base_url: String,
    page_limit: u32,
    page_delay: Duration,
    client: Client,
}

/// One page of the tickers response as the server sends it.
#[derive(Debug, Deserialize)]
struct TickersPage {
    status: Option<String>,
    error: Option<String>,
    #[serde(default)]
    results: Vec<TickerRecord>,
    next_url: Option<String>,
}

/// What to do after a page: follow the cursor, stop, or abort with a reason.
#[derive(Debug, PartialEq)]
enum PageStep {
    Next(String),
    Done,
    Abort(String),
}

impl PolygonClient {
    pub fn new(
        api_key: String,
        base_url: String,
        page_limit: u32,
        page_delay: Duration,
    ) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;
        Ok(Self {
            api_key,
            base_url,
            page_limit,
            page_delay,
            client,
        })
    }

    /// Retrieve every active stock ticker, ascending by symbol. Pagination
    /// aborts (JSON decode failure, non-OK API status) keep the records
    /// accumulated so far; transport errors propagate as `Err` and the run
    /// ends with nothing fetched.
    pub async fn fetch_all(&self) -> Result<FetchOutcome, String> {
        let mut url = self.first_page_url()?;
        let mut tickers: Vec<TickerRecord> = Vec::new();
        let mut pages = 0u64;
        let mut abort = None;

        loop {
            tracing::info!(url = %redacted(&url), "requesting tickers page");
            metrics::counter!("tickerlake.polygon.requests_total").increment(1);

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|err| format!("tickers request failed: {err}"))?;
            let body = response
                .text()
                .await
                .map_err(|err| format!("failed to read tickers response: {err}"))?;

            let (records, step) = evaluate_page(&body, &self.api_key);
            if !records.is_empty() {
                pages += 1;
                metrics::counter!("tickerlake.polygon.tickers_total")
                    .increment(records.len() as u64);
                tracing::debug!(page = pages, records = records.len(), "accumulated tickers page");
                tickers.extend(records);
            }

            match step {
                PageStep::Next(next) => {
                    url = next;
                    tokio::time::sleep(self.page_delay).await;
                }
                PageStep::Done => break,
                PageStep::Abort(reason) => {
                    tracing::warn!(error = %reason, "aborting ticker pagination");
                    metrics::counter!("tickerlake.polygon.aborts_total").increment(1);
                    abort = Some(reason);
                    break;
                }
            }
        }

        tracing::info!(
            pages,
            tickers = tickers.len(),
            aborted = abort.is_some(),
            "ticker fetch finished"
        );
        Ok(FetchOutcome {
            tickers,
            pages,
            abort,
        })
    }

    fn first_page_url(&self) -> Result<String, String> {
        let mut url = Url::parse(&self.base_url)
            .and_then(|base| base.join(TICKERS_PATH))
            .map_err(|err| format!("invalid API base url {}: {err}", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("market", "stocks")
            .append_pair("active", "true")
            .append_pair("order", "asc")
            .append_pair("limit", &self.page_limit.to_string())
            .append_pair("sort", "ticker")
            .append_pair("apiKey", &self.api_key);
        Ok(url.to_string())
    }
}

#[async_trait]
impl TickerSource for PolygonClient {
    async fn fetch_all(&self) -> Result<FetchOutcome, String> {
        PolygonClient::fetch_all(self).await
    }
}

/// Decide what one page contributes and where pagination goes next. The
/// server's `next_url` omits the credential, so it is re-appended here.
fn evaluate_page(body: &str, api_key: &str) -> (Vec<TickerRecord>, PageStep) {
    let page: TickersPage = match serde_json::from_str(body) {
        Ok(page) => page,
        Err(err) => {
            return (
                Vec::new(),
                PageStep::Abort(format!(
                    "invalid JSON response ({err}): {}",
                    body_snippet(body)
                )),
            );
        }
    };

    if page.status.as_deref() != Some(SUCCESS_STATUS) {
        let reason = page
            .error
            .unwrap_or_else(|| format!("unexpected API status {:?}", page.status));
        return (Vec::new(), PageStep::Abort(format!("API error: {reason}")));
    }

    if page.results.is_empty() {
        return (Vec::new(), PageStep::Done);
    }

    let step = match page.next_url {
        Some(next) => match append_api_key(&next, api_key) {
            Ok(url) => PageStep::Next(url),
            Err(err) => PageStep::Abort(err),
        },
        None => PageStep::Done,
    };
    (page.results, step)
}

fn append_api_key(next_url: &str, api_key: &str) -> Result<String, String> {
    let mut url =
        Url::parse(next_url).map_err(|err| format!("invalid next_url {next_url:?}: {err}"))?;
    url.query_pairs_mut().append_pair("apiKey", api_key);
    Ok(url.to_string())
}

fn body_snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_SNIPPET_LEN {
        trimmed.to_string()
    } else {
        let mut end = BODY_SNIPPET_LEN;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}

/// Request URLs carry the credential as a query parameter; log them with the
/// value masked.
fn redacted(url_str: &str) -> String {
    let Ok(mut url) = Url::parse(url_str) else {
        return "<unparseable url>".to_string();
    };
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "apiKey" {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}
