//! BoardGameGeek カタログ (XML API 2) クライアント
//!
//! 検索・詳細・hot リストの3操作を提供する。失敗は [`CatalogError`] として
//! 呼び出し側へそのまま返す (推薦クライアントと違い握りつぶさない)。

mod models;
mod parse;

use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::{Config, HOT_GAMES_LIMIT};
use crate::http::{FetchError, HttpGet, HttpRequest, ReqwestHttp, Timeout};

pub use models::{GameDetail, GameIds, HotGame, SearchResult, UNKNOWN};
pub use parse::{ParseError, game_url, parse_game_details, parse_hot_games, parse_search};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(#[from] FetchError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// カタログAPIクライアント
#[derive(Clone)]
pub struct CatalogClient {
    http: Arc<dyn HttpGet>,
    base_url: String,
    site_url: String,
    timeout: Timeout,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url)
            .field("site_url", &self.site_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CatalogClient {
    /// reqwest を使う通常のクライアントを作成
    pub fn new(config: &Config) -> Result<Self> {
        let http = ReqwestHttp::new(&config.user_agent)?;
        Ok(Self::with_http(config, Arc::new(http)))
    }

    /// 任意の [`HttpGet`] 実装を差し込んで作成
    pub fn with_http(config: &Config, http: Arc<dyn HttpGet>) -> Self {
        Self {
            http,
            base_url: config.catalog_base_url.trim_end_matches('/').to_string(),
            site_url: config.site_url.clone(),
            timeout: Timeout::After(Duration::from_secs(config.catalog_timeout_secs)),
        }
    }

    /// タイトル (部分一致) でボードゲームを検索する。拡張は除外される。
    #[instrument(name = "catalog_search", skip(self))]
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>, CatalogError> {
        let request = self
            .request("search")
            .query("query", query)
            .query("exact", "0")
            .query("type", "boardgame");
        let body = self.fetch(&request)?;
        Ok(parse_search(&body)?)
    }

    /// 1件以上のIDの詳細を取得する。IDはまとめて1リクエストで問い合わせる。
    #[instrument(name = "catalog_game_details", skip(self, ids))]
    pub fn get_game_details(&self, ids: impl Into<GameIds>) -> Result<Vec<GameDetail>, CatalogError> {
        let ids = ids.into();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let request = self
            .request("thing")
            .query("id", ids.joined())
            .query("stats", "1");
        let body = self.fetch(&request)?;
        Ok(parse_game_details(&body)?)
    }

    /// 本日の hot リスト (最大50件、上流の順位順)
    #[instrument(name = "catalog_hot_games", skip(self))]
    pub fn get_hot_games(&self) -> Result<Vec<HotGame>, CatalogError> {
        let request = self.request("hot").query("type", "boardgame");
        let body = self.fetch(&request)?;
        Ok(parse_hot_games(&body, &self.site_url, HOT_GAMES_LIMIT)?)
    }

    fn request(&self, endpoint: &str) -> HttpRequest {
        HttpRequest::get(format!("{}/{}", self.base_url, endpoint), self.timeout)
    }

    fn fetch(&self, request: &HttpRequest) -> Result<String, FetchError> {
        info!(target: "catalog", url = %request.url, params = ?request.query, "catalog_request");
        self.http.get(request)
    }
}

/// 環境設定からクライアントを作って検索する
pub fn search(query: &str) -> Result<Vec<SearchResult>> {
    Ok(CatalogClient::new(&Config::from_env()?)?.search(query)?)
}

/// 環境設定からクライアントを作って詳細を取得する
pub fn get_game_details(ids: impl Into<GameIds>) -> Result<Vec<GameDetail>> {
    Ok(CatalogClient::new(&Config::from_env()?)?.get_game_details(ids)?)
}

/// 環境設定からクライアントを作って hot リストを取得する
pub fn get_hot_games() -> Result<Vec<HotGame>> {
    Ok(CatalogClient::new(&Config::from_env()?)?.get_hot_games()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::ScriptedHttp;

    fn client(http: &Arc<ScriptedHttp>) -> CatalogClient {
        let config = Config {
            catalog_base_url: "http://bgg.test/xmlapi2/".into(),
            ..Config::default()
        };
        CatalogClient::with_http(&config, http.clone())
    }

    fn hot_xml(count: usize) -> String {
        let items: String = (1..=count)
            .map(|rank| format!(r#"<item id="{}" rank="{rank}"><name value="Game {rank}"/></item>"#, 1000 + rank))
            .collect();
        format!("<items>{items}</items>")
    }

    #[test]
    fn search_sends_filtered_query() -> Result<()> {
        let http = Arc::new(ScriptedHttp::new().respond(
            r#"<items><item id="13"><name type="primary" value="CATAN"/></item></items>"#,
        ));
        let results = client(&http).search("Catan & Co")?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].year, UNKNOWN);

        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://bgg.test/xmlapi2/search");
        assert_eq!(requests[0].query_value("query"), Some("Catan & Co"));
        assert_eq!(requests[0].query_value("exact"), Some("0"));
        assert_eq!(requests[0].query_value("type"), Some("boardgame"));
        assert_eq!(requests[0].timeout, Timeout::After(Duration::from_secs(20)));
        Ok(())
    }

    #[test]
    fn search_propagates_network_and_parse_errors() {
        let http = Arc::new(ScriptedHttp::new().refuse().fail(503).respond("not xml <"));
        let c = client(&http);
        assert!(matches!(c.search("a"), Err(CatalogError::Network(FetchError::Transport { .. }))));
        assert!(matches!(c.search("a"), Err(CatalogError::Network(FetchError::Status { status: 503, .. }))));
        assert!(matches!(c.search("a"), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn details_join_ids_into_one_request() -> Result<()> {
        let http = Arc::new(ScriptedHttp::new().respond("<items/>"));
        client(&http).get_game_details(vec!["1", "2"])?;
        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://bgg.test/xmlapi2/thing");
        assert_eq!(requests[0].query_value("id"), Some("1,2"));
        assert_eq!(requests[0].query_value("stats"), Some("1"));
        Ok(())
    }

    #[test]
    fn details_single_id_matches_singleton_list() -> Result<()> {
        let http = Arc::new(ScriptedHttp::new().respond("<items/>").respond("<items/>"));
        let c = client(&http);
        c.get_game_details("1")?;
        c.get_game_details(["1"])?;
        let requests = http.requests();
        assert_eq!(requests[0], requests[1]);
        Ok(())
    }

    #[test]
    fn details_without_ids_skip_the_request() -> Result<()> {
        let http = Arc::new(ScriptedHttp::new());
        let details = client(&http).get_game_details(" , ")?;
        assert!(details.is_empty());
        assert!(http.requests().is_empty());
        Ok(())
    }

    #[test]
    fn hot_games_are_capped_and_enriched() -> Result<()> {
        let http = Arc::new(ScriptedHttp::new().respond(hot_xml(55)));
        let hot = client(&http).get_hot_games()?;
        assert_eq!(hot.len(), HOT_GAMES_LIMIT);
        assert_eq!(hot[0].rank, "1");
        assert_eq!(hot[49].rank, "50");
        assert_eq!(hot[0].url, "https://boardgamegeek.com/boardgame/1001");
        assert_eq!(http.requests()[0].query_value("type"), Some("boardgame"));
        Ok(())
    }
}
