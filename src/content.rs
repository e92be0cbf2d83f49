//! Read-only lookups against public content APIs.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

const JOKE_URL: &str = "https://v2.jokeapi.dev/joke/Any?blacklistFlags=nsfw,religious,political,racist,sexist,explicit&type=single";
const CAT_URL: &str = "https://api.thecatapi.com/v1/images/search";
const DOG_URL: &str = "https://dog.ceo/api/breeds/image/random";
const QUOTE_URL: &str = "https://api.quotable.io/random";
const FACT_URL: &str = "https://uselessfacts.jsph.pl/random.json?language=en";
const CRYPTO_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
const DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en/";
const WIKI_SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary/";
const QR_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("response has no '{0}'")]
    MissingField(&'static str),
    #[error("cannot build request url: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Deserialize)]
struct Joke {
    joke: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct DogImage {
    message: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Quote {
    pub content: String,
    pub author: String,
}

#[derive(Debug, Deserialize)]
struct Fact {
    text: String,
}

#[derive(Debug, Deserialize)]
struct DictionaryEntry {
    #[serde(default)]
    meanings: Vec<Meaning>,
}

#[derive(Debug, Deserialize)]
struct Meaning {
    #[serde(default)]
    definitions: Vec<Definition>,
}

#[derive(Debug, Deserialize)]
struct Definition {
    definition: String,
}

#[derive(Debug, Deserialize)]
struct WikiSummary {
    #[serde(rename = "type")]
    kind: String,
    title: String,
    #[serde(default)]
    extract: String,
    content_urls: Option<WikiUrls>,
}

#[derive(Debug, Deserialize)]
struct WikiUrls {
    desktop: WikiPage,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    page: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WikiLookup {
    Found {
        title: String,
        summary: String,
        url: String,
    },
    /// Disambiguation page; `url` lists the candidate articles
    Ambiguous {
        title: String,
        url: String,
    },
    NotFound,
}

/// HTTP client for the content APIs. Every request is bounded by the
/// configured timeout; a timeout surfaces as an ordinary HTTP error.
#[derive(Clone)]
pub struct ContentClient {
    client: reqwest::Client,
}

impl ContentClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("commandbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ContentError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Like `get_json`, but a 404 means "no such thing" rather than an error
    async fn get_json_optional<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>, ContentError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json().await?))
    }

    pub async fn joke(&self) -> Result<String, ContentError> {
        let joke: Joke = self.get_json(JOKE_URL).await?;
        joke.joke.ok_or(ContentError::MissingField("joke"))
    }

    pub async fn cat_image_url(&self) -> Result<String, ContentError> {
        let images: Vec<CatImage> = self.get_json(CAT_URL).await?;
        images
            .into_iter()
            .next()
            .map(|image| image.url)
            .ok_or(ContentError::MissingField("url"))
    }

    pub async fn dog_image_url(&self) -> Result<String, ContentError> {
        let image: DogImage = self.get_json(DOG_URL).await?;
        Ok(image.message)
    }

    pub async fn quote(&self) -> Result<Quote, ContentError> {
        self.get_json(QUOTE_URL).await
    }

    pub async fn fact(&self) -> Result<String, ContentError> {
        let fact: Fact = self.get_json(FACT_URL).await?;
        Ok(fact.text)
    }

    /// USD price of `coin`, `None` if the API doesn't know the coin
    pub async fn crypto_price(&self, coin: &str) -> Result<Option<f64>, ContentError> {
        let url = Url::parse_with_params(CRYPTO_URL, &[("ids", coin), ("vs_currencies", "usd")])?;
        let prices: HashMap<String, HashMap<String, f64>> = self.get_json(url.as_str()).await?;
        Ok(prices.get(coin).and_then(|p| p.get("usd")).copied())
    }

    /// First definition of `word`, `None` if the dictionary has no entry
    pub async fn definition(&self, word: &str) -> Result<Option<String>, ContentError> {
        let url = push_segment(DICTIONARY_URL, word)?;
        let entries: Option<Vec<DictionaryEntry>> = self.get_json_optional(url.as_str()).await?;
        Ok(entries.and_then(first_definition))
    }

    pub async fn wiki_summary(&self, query: &str) -> Result<WikiLookup, ContentError> {
        let url = push_segment(WIKI_SUMMARY_URL, &query.replace(' ', "_"))?;
        let summary: Option<WikiSummary> = self.get_json_optional(url.as_str()).await?;
        Ok(summary.map_or(WikiLookup::NotFound, WikiLookup::from))
    }
}

/// URL of a PNG QR code encoding `text`
pub fn qr_image_url(text: &str) -> Result<String, ContentError> {
    let url = Url::parse_with_params(QR_URL, &[("size", "300x300"), ("data", text)])?;
    Ok(url.into())
}

fn push_segment(base: &str, segment: &str) -> Result<Url, ContentError> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| ContentError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

fn first_definition(entries: Vec<DictionaryEntry>) -> Option<String> {
    entries
        .into_iter()
        .next()?
        .meanings
        .into_iter()
        .next()?
        .definitions
        .into_iter()
        .next()
        .map(|d| d.definition)
}

impl From<WikiSummary> for WikiLookup {
    fn from(summary: WikiSummary) -> Self {
        let url = summary
            .content_urls
            .map(|urls| urls.desktop.page)
            .unwrap_or_default();
        if summary.kind == "disambiguation" {
            return WikiLookup::Ambiguous {
                title: summary.title,
                url,
            };
        }
        let first_paragraph = summary
            .extract
            .split('\n')
            .next()
            .unwrap_or_default()
            .to_string();
        WikiLookup::Found {
            title: summary.title,
            summary: first_paragraph,
            url,
        }
    }
}

/// `1234.5` -> `1,234.50`
pub fn format_usd(price: f64) -> String {
    let fixed = format!("{:.2}", price.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if price < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, cents)
}

/// `bitcoin` -> `Bitcoin`
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
