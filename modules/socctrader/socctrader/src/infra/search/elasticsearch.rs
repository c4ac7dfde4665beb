//! Elasticsearch adapter.
//!
//! One index per record kind (`{prefix}{kind}`), the record body as `_source`
//! plus a checksum field, and the store version as the external document
//! version. Elasticsearch enforces the ordering: a `409` on write means a
//! newer version is already there and is treated as success.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use socckit::{Page, PageRequest};
use socctrader_sdk::EntityKind;
use tracing::{debug, instrument};
use url::Url;

use super::query::Query;
use crate::config::SearchConfig;
use crate::domain::ports::{IndexDocument, IndexEntry, IndexError, SearchIndex, body_checksum};

/// `_source` field holding the body checksum used by reconciliation.
pub const CHECKSUM_FIELD: &str = "indexChecksum";

/// Elasticsearch's default `index.max_result_window`.
pub const MAX_RESULT_WINDOW: u64 = 10_000;

const ENTRIES_BATCH: u64 = 1000;
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    total: Option<Total>,
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Total {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_version")]
    version: Option<i64>,
    #[serde(rename = "_source", default)]
    source: Map<String, Value>,
    #[serde(default)]
    sort: Vec<Value>,
}

impl Hit {
    fn into_document(mut self, kind: EntityKind) -> Result<IndexDocument, IndexError> {
        let id = self
            .id
            .parse::<i64>()
            .map_err(|_| IndexError::Decode(format!("non-numeric document id '{}'", self.id)))?;

        let stored_checksum = match self.source.remove(CHECKSUM_FIELD) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let body = Value::Object(self.source);
        let checksum = match stored_checksum {
            Some(checksum) => checksum,
            None => body_checksum(&body).map_err(|e| IndexError::Decode(e.to_string()))?,
        };
        let version = self
            .version
            .or_else(|| body.get("version").and_then(Value::as_i64))
            .unwrap_or_default();

        Ok(IndexDocument {
            kind,
            id,
            version,
            checksum,
            body,
        })
    }
}

/// Fields unqualified query terms run against: the record fields without
/// `version` and the checksum.
fn search_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Country => &["id", "countryId", "countryName"],
        EntityKind::Region => &["id", "regionId", "regionName"],
        EntityKind::League => &["id", "leagueId", "leagueName", "locationId"],
        EntityKind::Team => &["id", "teamId", "teamName", "leagueId", "gameId"],
        EntityKind::Game => &["id", "hostId", "visitorId"],
        EntityKind::FinancialAction => &["id", "actionId", "action", "amount", "currency", "userId"],
    }
}

pub struct ElasticsearchIndex {
    client: Client,
    base: String,
    prefix: String,
}

impl ElasticsearchIndex {
    /// # Errors
    /// Returns [`IndexError::Unavailable`] when the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(cfg: &SearchConfig) -> Result<Self, IndexError> {
        let url = Url::parse(&cfg.url)
            .map_err(|e| IndexError::Unavailable(format!("invalid search url '{}': {e}", cfg.url)))?;
        let client = Client::builder()
            .timeout(cfg.request_timeout())
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base: url.as_str().trim_end_matches('/').to_owned(),
            prefix: cfg.index_prefix.clone(),
        })
    }

    fn index_url(&self, kind: EntityKind) -> String {
        format!("{}/{}{}", self.base, self.prefix, kind.index_name())
    }

    fn doc_url(&self, kind: EntityKind, id: i64) -> String {
        format!("{}/_doc/{id}", self.index_url(kind))
    }

    async fn search(&self, kind: EntityKind, body: Value) -> Result<Option<SearchResponse>, IndexError> {
        let response = self
            .client
            .post(format!("{}/_search", self.index_url(kind)))
            .json(&body)
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            // The index is created by the first write.
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::BAD_REQUEST => {
                let rejected = rejected(response).await;
                Err(IndexError::InvalidQuery(rejected.to_string()))
            }
            status if status.is_success() => response
                .json::<SearchResponse>()
                .await
                .map(Some)
                .map_err(|e| IndexError::Decode(e.to_string())),
            _ => Err(rejected(response).await),
        }
    }
}

fn unavailable(e: reqwest::Error) -> IndexError {
    IndexError::Unavailable(e.to_string())
}

async fn rejected(response: Response) -> IndexError {
    let status = response.status().as_u16();
    let mut message = response.text().await.unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| message.is_char_boundary(*i))
            .unwrap_or(0);
        message.truncate(cut);
    }
    IndexError::Rejected { status, message }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    fn backend(&self) -> &'static str {
        "elasticsearch"
    }

    #[instrument(skip_all, fields(kind = %doc.kind, id = doc.id, version = doc.version))]
    async fn index(&self, doc: IndexDocument) -> Result<(), IndexError> {
        let mut source = match doc.body {
            Value::Object(map) => map,
            other => {
                return Err(IndexError::Decode(format!(
                    "document body must be an object, got {other}"
                )));
            }
        };
        source.insert(CHECKSUM_FIELD.to_owned(), Value::String(doc.checksum));

        let response = self
            .client
            .put(self.doc_url(doc.kind, doc.id))
            .query(&[("version", doc.version.to_string().as_str()), ("version_type", "external_gte")])
            .json(&source)
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            StatusCode::CONFLICT => {
                debug!("newer version already indexed");
                Ok(())
            }
            status if status.is_success() => Ok(()),
            _ => Err(rejected(response).await),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, kind: EntityKind, id: i64, version: i64) -> Result<(), IndexError> {
        let response = self
            .client
            .delete(self.doc_url(kind, id))
            .query(&[("version", version.to_string().as_str()), ("version_type", "external")])
            .send()
            .await
            .map_err(unavailable)?;

        // 404: nothing to delete. 409: a newer delete already landed.
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND || status == StatusCode::CONFLICT {
            Ok(())
        } else {
            Err(rejected(response).await)
        }
    }

    #[instrument(skip(self, page), fields(page = page.page, size = page.size))]
    async fn query(
        &self,
        kind: EntityKind,
        text: &str,
        page: &PageRequest,
    ) -> Result<Page<IndexDocument>, IndexError> {
        Query::parse(text).map_err(|e| IndexError::InvalidQuery(e.to_string()))?;
        if page.offset().saturating_add(page.size) > MAX_RESULT_WINDOW {
            return Err(IndexError::WindowExceeded {
                limit: MAX_RESULT_WINDOW,
            });
        }

        let body = json!({
            "from": page.offset(),
            "size": page.size,
            "version": true,
            "track_total_hits": true,
            "sort": [{ "id": "asc" }],
            "query": {
                "query_string": {
                    "query": text,
                    "fields": search_fields(kind),
                    "default_operator": "OR",
                    "lenient": true,
                }
            }
        });

        let Some(response) = self.search(kind, body).await? else {
            return Ok(Page::empty(page));
        };

        let total = response.hits.total.map_or(0, |t| t.value);
        let items = response
            .hits
            .hits
            .into_iter()
            .map(|hit| hit.into_document(kind))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, page, total))
    }

    #[instrument(skip(self))]
    async fn entries(&self, kind: EntityKind) -> Result<Vec<IndexEntry>, IndexError> {
        let mut entries = Vec::new();
        let mut after: Option<Vec<Value>> = None;

        loop {
            let mut body = json!({
                "size": ENTRIES_BATCH,
                "version": true,
                "sort": [{ "id": "asc" }],
                "query": { "match_all": {} }
            });
            if let Some(cursor) = after.take() {
                body["search_after"] = Value::Array(cursor);
            }

            let Some(response) = self.search(kind, body).await? else {
                break;
            };

            let hits = response.hits.hits;
            let fetched = u64::try_from(hits.len()).unwrap_or(u64::MAX);
            for mut hit in hits {
                after = Some(std::mem::take(&mut hit.sort));
                entries.push(hit.into_document(kind)?.entry());
            }

            if fetched < ENTRIES_BATCH || after.as_ref().is_none_or(Vec::is_empty) {
                break;
            }
        }

        debug!(entries = entries.len(), "listed index entries");
        Ok(entries)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use httpmock::prelude::*;

    use super::*;
    use crate::config::SearchBackend;

    fn adapter(server: &MockServer) -> ElasticsearchIndex {
        ElasticsearchIndex::new(&SearchConfig {
            backend: SearchBackend::Elasticsearch,
            url: server.base_url(),
            index_prefix: "test-".to_owned(),
            request_timeout_ms: 2000,
        })
        .unwrap()
    }

    fn team_doc(version: i64) -> IndexDocument {
        let body = json!({"id": 4, "version": version, "teamName": "AAAAA"});
        IndexDocument {
            kind: EntityKind::Team,
            id: 4,
            version,
            checksum: body_checksum(&body).unwrap(),
            body,
        }
    }

    #[tokio::test]
    async fn index_sends_external_version() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/test-team/_doc/4")
                .query_param("version", "2")
                .query_param("version_type", "external_gte")
                .body_includes(r#""teamName":"AAAAA""#);
            then.status(201).json_body(json!({"result": "created"}));
        });

        adapter(&server).index(team_doc(2)).await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn version_conflict_is_not_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PUT).path("/test-team/_doc/4");
            then.status(409).json_body(json!({"error": {"type": "version_conflict_engine_exception"}}));
        });
        server.mock(|when, then| {
            when.method(DELETE).path("/test-team/_doc/4");
            then.status(404);
        });

        let index = adapter(&server);
        index.index(team_doc(1)).await.unwrap();
        index.delete(EntityKind::Team, 4, 1 << 62).await.unwrap();
    }

    #[tokio::test]
    async fn server_errors_are_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PUT).path("/test-team/_doc/4");
            then.status(503).body("unavailable");
        });

        let err = adapter(&server).index(team_doc(1)).await.unwrap_err();
        assert_eq!(
            err,
            IndexError::Rejected {
                status: 503,
                message: "unavailable".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn query_decodes_hits_and_strips_the_checksum() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/test-team/_search")
                .body_includes(r#""query":"teamName:AAAAA""#);
            then.status(200).json_body(json!({
                "hits": {
                    "total": {"value": 1, "relation": "eq"},
                    "hits": [{
                        "_id": "4",
                        "_version": 2,
                        "_source": {"id": 4, "version": 2, "teamName": "AAAAA", "indexChecksum": "abc"},
                        "sort": [4]
                    }]
                }
            }));
        });

        let page = adapter(&server)
            .query(EntityKind::Team, "teamName:AAAAA", &PageRequest::of(0, 20))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        let doc = &page.items[0];
        assert_eq!((doc.id, doc.version, doc.checksum.as_str()), (4, 2, "abc"));
        assert!(doc.body.get(CHECKSUM_FIELD).is_none());
    }

    #[tokio::test]
    async fn malformed_query_never_reaches_the_server() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/test-team/_search");
            then.status(200);
        });

        let err = adapter(&server)
            .query(EntityKind::Team, "teamName:", &PageRequest::of(0, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidQuery(_)));
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn unqualified_terms_are_limited_to_record_fields() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/test-game/_search")
                .body_includes(r#""fields":["id","hostId","visitorId"]"#);
            then.status(200).json_body(json!({"hits": {"total": {"value": 0}, "hits": []}}));
        });

        let page = adapter(&server)
            .query(EntityKind::Game, "10", &PageRequest::of(0, 20))
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        mock.assert();
    }

    #[tokio::test]
    async fn pages_past_the_result_window_are_refused() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/test-team/_search");
            then.status(400);
        });

        let err = adapter(&server)
            .query(EntityKind::Team, "*", &PageRequest::of(10, 1000))
            .await
            .unwrap_err();
        assert_eq!(err, IndexError::WindowExceeded { limit: MAX_RESULT_WINDOW });
        mock.assert_calls(0);

        // The last page inside the window is still sent.
        let err = adapter(&server)
            .query(EntityKind::Team, "*", &PageRequest::of(9, 1000))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidQuery(_)));
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn missing_index_lists_no_entries() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/test-country/_search");
            then.status(404).json_body(json!({"error": {"type": "index_not_found_exception"}}));
        });

        let entries = adapter(&server).entries(EntityKind::Country).await.unwrap();
        assert!(entries.is_empty());
    }
}
