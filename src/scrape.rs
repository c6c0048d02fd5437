//! Content source adapter: fetches one page of the excuse site and pulls the
//! quote and its navigation links out of the markup.

use std::future::Future;
use std::sync::Arc;

use once_cell::sync::Lazy;
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Selector};

use crate::error::FetchError;

pub const DEFAULT_BASE_URL: &str = "https://cyber.excusesecu.fr/";

static QUOTE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".quote").expect("static selector"));
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".links a").expect("static selector"));

/// What one page of the source yields. Any field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub quote: String,
    pub next_link: String,
    pub previous_link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Next,
    Previous,
}

/// Decides which navigation anchor an anchor label stands for.
pub trait LinkClassifier: Send + Sync {
    fn classify(&self, label: &str) -> Option<LinkKind>;
}

/// Exact match on the anchor's visible text.
#[derive(Debug, Clone)]
pub struct LabelClassifier {
    pub next: String,
    pub previous: String,
}

impl LabelClassifier {
    pub fn new(next: impl Into<String>, previous: impl Into<String>) -> Self {
        Self { next: next.into(), previous: previous.into() }
    }
}

impl Default for LabelClassifier {
    fn default() -> Self {
        Self::new("Excuse suivante", "Excuse précédente")
    }
}

impl LinkClassifier for LabelClassifier {
    fn classify(&self, label: &str) -> Option<LinkKind> {
        let label = label.trim();
        if label == self.next {
            Some(LinkKind::Next)
        } else if label == self.previous {
            Some(LinkKind::Previous)
        } else {
            None
        }
    }
}

/// Anything that can turn a page reference into a [`Page`].
pub trait QuoteSource: Send + Sync + 'static {
    fn fetch(&self, page_ref: &str) -> impl Future<Output = Result<Page, FetchError>> + Send;

    /// The absolute URL a page reference points at, for logging.
    fn resolve(&self, page_ref: &str) -> String;
}

/// `""` is the base itself, `"/x"` is `base + "x"`, anything else is taken as absolute.
pub fn resolve_url(base: &str, page_ref: &str) -> String {
    if page_ref.is_empty() {
        base.to_string()
    } else if let Some(rest) = page_ref.strip_prefix('/') {
        format!("{}{}", base, rest)
    } else {
        page_ref.to_string()
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Pull the quote and the navigation links out of a page. A page without a
/// quote element yields an empty quote, not an error.
pub fn extract_page(html: &str, classifier: &dyn LinkClassifier) -> Page {
    let document = Html::parse_document(html);
    let mut page = Page::default();

    // Later matches overwrite earlier ones.
    for el in document.select(&QUOTE_SELECTOR) {
        page.quote = element_text(el);
    }

    for anchor in document.select(&LINK_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        match classifier.classify(&element_text(anchor)) {
            Some(LinkKind::Next) => page.next_link = href.to_string(),
            Some(LinkKind::Previous) => page.previous_link = href.to_string(),
            None => {}
        }
    }

    page
}

/// The live excuse site over HTTP. One GET per call, no retries.
#[derive(Clone)]
pub struct ExcuseSite {
    client: Client,
    base_url: String,
    classifier: Arc<dyn LinkClassifier>,
}

impl ExcuseSite {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_classifier(base_url, Arc::new(LabelClassifier::default()))
    }

    pub fn with_classifier(base_url: &str, classifier: Arc<dyn LinkClassifier>) -> Result<Self, FetchError> {
        let mut base_url = base_url.trim().to_string();
        if base_url.is_empty() {
            base_url = DEFAULT_BASE_URL.to_string();
        }
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Url::parse(&base_url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = Client::builder()
            .user_agent(concat!("excuses/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url, classifier })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl QuoteSource for ExcuseSite {
    fn resolve(&self, page_ref: &str) -> String {
        resolve_url(&self.base_url, page_ref)
    }

    async fn fetch(&self, page_ref: &str) -> Result<Page, FetchError> {
        let url = self.resolve(page_ref);
        let parsed = Url::parse(&url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

        tracing::debug!(url = %parsed, "Fetching URL");
        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), url = %response.url(), "Received response");

        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), url });
        }

        let body = response.text().await.map_err(|e| FetchError::Body(e.to_string()))?;
        let page = extract_page(&body, self.classifier.as_ref());

        if page.quote.is_empty() {
            tracing::debug!(url = %url, "No quote element on page");
        } else {
            tracing::debug!(quote = %page.quote.trim(), "Found quote");
        }
        if !page.next_link.is_empty() {
            tracing::debug!(next_link = %page.next_link, "Found next link");
        }
        if !page.previous_link.is_empty() {
            tracing::debug!(prev_link = %page.previous_link, "Found previous link");
        }

        Ok(page)
    }
}
