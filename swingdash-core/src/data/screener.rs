//! Best-effort fundamentals scraped from screener.in company pages.
//!
//! Page structure is not under our control, so everything here degrades to an
//! empty snapshot: network errors, non-200 responses, missing sections and
//! markup changes all come back as "nothing found".

use crate::config::ProviderConfig;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// Flat `label -> text` map, e.g. `"Stock P/E" -> "24.5"`.
pub type Snapshot = BTreeMap<String, String>;

const SCREENER_URL: &str = "https://www.screener.in/company";

/// Source of scraped fundamentals keyed by bare exchange code (`RELIANCE`, not `RELIANCE.NS`).
pub trait SnapshotProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Never fails; an unavailable page is an empty snapshot.
    fn fetch_snapshot(&self, code: &str) -> Snapshot;
}

impl<S: SnapshotProvider + ?Sized> SnapshotProvider for std::sync::Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_snapshot(&self, code: &str) -> Snapshot {
        (**self).fetch_snapshot(code)
    }
}

/// Provider that never has anything, for offline runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSnapshotProvider;

impl SnapshotProvider for NullSnapshotProvider {
    fn name(&self) -> &str {
        "none"
    }

    fn fetch_snapshot(&self, _code: &str) -> Snapshot {
        Snapshot::new()
    }
}

pub struct ScreenerProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl ScreenerProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, super::DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent("Mozilla/5.0")
            .build()
            .map_err(|e| super::DataError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: SCREENER_URL.to_string(),
        })
    }

    fn fetch_page(&self, code: &str) -> Result<String, reqwest::Error> {
        let url = format!("{}/{code}/", self.base_url);
        self.client.get(url).send()?.error_for_status()?.text()
    }
}

impl SnapshotProvider for ScreenerProvider {
    fn name(&self) -> &str {
        "screener.in"
    }

    fn fetch_snapshot(&self, code: &str) -> Snapshot {
        if code.is_empty() {
            return Snapshot::new();
        }
        tracing::debug!(code, "fetching screener page");
        match self.fetch_page(code) {
            Ok(html) => {
                let snapshot = parse_screener_html(&html);
                if snapshot.is_empty() {
                    tracing::warn!(code, "screener page had no recognisable fundamentals");
                }
                snapshot
            }
            Err(e) => {
                tracing::warn!(code, error = %e, "screener fetch failed");
                Snapshot::new()
            }
        }
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Element text with each fragment trimmed and joined by single spaces.
fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `(span.name, span.value)` pairs from every element matched by `items`.
fn name_value_pairs(doc: &Html, items: &Selector, out: &mut Snapshot) {
    let (Some(name), Some(value)) = (selector("span.name"), selector("span.value")) else {
        return;
    };
    for item in doc.select(items) {
        let key = item.select(&name).next().map(text_of);
        let val = item.select(&value).next().map(text_of);
        if let (Some(key), Some(val)) = (key, val) {
            if !key.is_empty() {
                out.insert(key, val);
            }
        }
    }
}

/// Extract the ratios box, factoid list and shareholding table from a company page.
///
/// Later sections overwrite earlier ones on duplicate labels.
pub fn parse_screener_html(html: &str) -> Snapshot {
    let doc = Html::parse_document(html);
    let mut snapshot = Snapshot::new();

    if let Some(ratios) = selector("div.company-ratios li") {
        name_value_pairs(&doc, &ratios, &mut snapshot);
    }
    if let Some(factoids) = selector("li.flex.flex-space-between") {
        name_value_pairs(&doc, &factoids, &mut snapshot);
    }
    if let (Some(rows), Some(cells)) = (selector("section#shareholding tr"), selector("td")) {
        for row in doc.select(&rows) {
            let cols: Vec<String> = row.select(&cells).map(text_of).collect();
            if let [label, value, ..] = cols.as_slice() {
                if !label.is_empty() {
                    snapshot.insert(label.clone(), value.clone());
                }
            }
        }
    }

    snapshot
}
