use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::types::{stdResult, AnswerResult, Result};

/// How long a single lookup may take before it is abandoned.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(8);

pub const FALLBACK_ANSWER: &str =
    "I couldn't find a concise answer right now. Try rephrasing or asking for a summary.";

/// Subset of the instant-answer payload the client looks at. Every field is read leniently,
/// a field of an unexpected shape counts as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstantAnswer {
    #[serde(default, deserialize_with = "text")]
    pub abstract_text: Option<String>,
    #[serde(default, rename = "AbstractURL", deserialize_with = "text")]
    pub abstract_url: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub abstract_source: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub definition: Option<String>,
    #[serde(default, rename = "DefinitionURL", deserialize_with = "text")]
    pub definition_url: Option<String>,
    #[serde(default, deserialize_with = "topics")]
    pub related_topics: Vec<RelatedTopic>,
}

/// Entry of `RelatedTopics`. Category entries carry their own `Topics`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RelatedTopic {
    #[serde(default, deserialize_with = "text")]
    pub text: Option<String>,
    #[serde(default, rename = "FirstURL", deserialize_with = "text")]
    pub first_url: Option<String>,
    #[serde(default, deserialize_with = "topics")]
    pub topics: Vec<RelatedTopic>,
}

impl RelatedTopic {
    fn answer(&self) -> Option<AnswerResult> {
        match (&self.text, &self.first_url) {
            (Some(answer), Some(url)) => {
                Some(AnswerResult { answer: answer.clone(), source_url: Some(url.clone()) })
            },
            _ => None,
        }
    }
}

/// Reads a field as text. Nulls, `false`, zero, empty strings and empty containers count as
/// absent, other scalars and containers are kept in their JSON form.
fn text<'de, D>(deserializer: D) -> stdResult<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Reads a list of topics. Anything but an array is an empty list, entries that aren't objects
/// are skipped.
fn topics<'de, D>(deserializer: D) -> stdResult<Vec<RelatedTopic>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(vec![]);
    };
    Ok(entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| RelatedTopic::deserialize(entry).ok())
        .collect())
}

impl InstantAnswer {
    /// Reads a payload. Only a JSON object is a valid payload.
    pub fn from_value(value: Value) -> stdResult<Self, Error> {
        match value {
            Value::Object(_) => Self::deserialize(value).map_err(Into::into),
            _ => Err(Error::NotAnObject),
        }
    }

    /// Picks the best answer in the payload. The abstract wins, then the direct answer, then
    /// the definition, then the first related topic (one level of nesting deep) that has both
    /// a text and a url.
    pub fn select(self) -> AnswerResult {
        if let Some(answer) = self.abstract_text {
            return AnswerResult { answer, source_url: self.abstract_url.or(self.abstract_source) };
        }
        if let Some(answer) = self.answer {
            return AnswerResult { answer, source_url: None };
        }
        if let Some(answer) = self.definition {
            return AnswerResult { answer, source_url: self.definition_url };
        }

        self.related_topics
            .iter()
            .find_map(|topic| {
                topic.answer().or_else(|| topic.topics.iter().find_map(RelatedTopic::answer))
            })
            .unwrap_or_else(|| AnswerResult { answer: FALLBACK_ANSWER.to_owned(), source_url: None })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("malformed payload: expected a JSON object")]
    NotAnObject,
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Instant-answer client. Every call is a single attempt with a fixed timeout.
pub struct LookupClient {
    url: Url,
    http: Client,
}

impl LookupClient {
    /// Create a new client from the base url of the instant-answer service.
    pub fn new(url: &str) -> Result<LookupClient> {
        Self::with_timeout(url, LOOKUP_TIMEOUT)
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<LookupClient> {
        let url = Url::parse(url)?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(LookupClient { url, http })
    }

    /// Fetch the raw instant-answer payload for `query`.
    pub async fn fetch(&self, query: &str) -> stdResult<InstantAnswer, Error> {
        self.http
            .get(self.url.clone())
            .query(&[("q", query), ("format", "json"), ("no_redirect", "1"), ("no_html", "1")])
            .send()
            .await
            .and_then(Response::error_for_status)?
            .json::<Value>()
            .await
            .map_err(Error::from)
            .and_then(InstantAnswer::from_value)
    }

    /// Look up a concise answer for `query`. Network errors, non-2xx responses and malformed
    /// payloads all fail the whole lookup.
    pub async fn answer(&self, query: &str) -> stdResult<AnswerResult, Error> {
        self.fetch(query).await.map(InstantAnswer::select)
    }
}
