//! recommend.games 類似ゲーム推薦クライアント
//!
//! 1 回の呼び出しは次の流れで進む:
//! 1. `start + 1` ページ目を取得
//! 2. 投票数・推薦スコアでフィルタして蓄積
//! 3. 空ページ / `end` 件到達 / `next` 無し のいずれかで終了、そうでなければ次ページへ
//! 4. 推薦スコア → ベイズ平均 → 平均 の降順で並べ、`limit` 件に切り詰める
//!
//! 推薦は「ベストエフォート」扱い: 通信失敗・非2xx・不正JSONはどのページで起きても
//! 警告ログを出して空の `Vec` を返す。途中まで集めた結果も捨てる。

mod models;

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use reqwest::Url;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, MIN_NUM_VOTES};
use crate::http::{FetchError, HttpGet, HttpRequest, ReqwestHttp, Timeout};

pub use models::{NO_DESCRIPTION, RecommendRecord, SimilarGame, SimilarPage};

/// サーバ側の並び順指定
pub const ORDERING: &str = "-rec_rating,-bayes_rating,-avg_rating";

/// Which flavour of the similar-games lookup is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarVariant {
    /// One implicit page, no `page` parameter.
    SinglePage,
    /// Sequential pages starting at `start + 1`.
    Paginated,
}

impl SimilarVariant {
    /// Rec ratings must be strictly greater than this to be kept.
    pub fn rec_rating_threshold(self) -> f64 {
        match self {
            SimilarVariant::SinglePage => 0.0,
            SimilarVariant::Paginated => 0.001,
        }
    }
}

/// Options for [`RecommendClient::get_similar_games_v2`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarQuery {
    /// Maximum results returned; `0` or negative means no limit.
    pub limit: i64,
    /// Zero-based page offset; the first page requested is `start + 1`.
    pub start: u32,
    /// Cap on accumulated results and on the last page number requested.
    pub end: u32,
    /// Wait without a timeout.
    pub block: bool,
}

impl Default for SimilarQuery {
    fn default() -> Self {
        Self { limit: 5, start: 0, end: 25, block: false }
    }
}

#[derive(Debug, Error)]
enum RecommendError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid JSON from recommendation API: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot build similar-games URL from base {0}")]
    Url(String),
}

/// 推薦APIクライアント
#[derive(Clone)]
pub struct RecommendClient {
    http: Arc<dyn HttpGet>,
    base_url: String,
    timeout_secs: u64,
}

impl std::fmt::Debug for RecommendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendClient")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RecommendClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = ReqwestHttp::new(&config.user_agent)?;
        Ok(Self::with_http(config, Arc::new(http)))
    }

    pub fn with_http(config: &Config, http: Arc<dyn HttpGet>) -> Self {
        Self {
            http,
            base_url: config.recommend_base_url.clone(),
            timeout_secs: config.recommend_timeout_secs,
        }
    }

    /// 1ページだけ取得する版。`limit` の意味は v2 と同じ。
    pub fn get_similar_games(&self, game_id: &str, limit: i64, block: bool) -> Vec<SimilarGame> {
        let query = SimilarQuery { limit, block, ..SimilarQuery::default() };
        self.run(game_id, query, SimilarVariant::SinglePage)
    }

    /// ページングしながら取得する版 (標準)
    pub fn get_similar_games_v2(&self, game_id: &str, query: SimilarQuery) -> Vec<SimilarGame> {
        self.run(game_id, query, SimilarVariant::Paginated)
    }

    fn run(&self, game_id: &str, query: SimilarQuery, variant: SimilarVariant) -> Vec<SimilarGame> {
        let game_id = game_id.trim();
        if game_id.is_empty() {
            warn!(target: "recommend", "similar_games_skipped: empty game id");
            return Vec::new();
        }
        match self.collect(game_id, query, variant) {
            Ok(games) => games,
            Err(e) => {
                let report = color_eyre::eyre::Report::new(e);
                let chain: Vec<String> = report.chain().map(|c| c.to_string()).collect();
                warn!(target: "recommend", game_id, ?variant, error = %report, ?chain, "similar_games_failed");
                Vec::new()
            }
        }
    }

    fn collect(
        &self,
        game_id: &str,
        query: SimilarQuery,
        variant: SimilarVariant,
    ) -> Result<Vec<SimilarGame>, RecommendError> {
        let url = self.similar_url(game_id)?;
        let threshold = variant.rec_rating_threshold();
        let end = query.end as usize;
        let timeout = if query.block {
            Timeout::Unbounded
        } else {
            Timeout::After(Duration::from_secs(self.timeout_secs))
        };

        let mut accepted: Vec<RecommendRecord> = Vec::new();
        let mut page = query.start.saturating_add(1);
        loop {
            let mut request = HttpRequest::get(url.as_str(), timeout)
                .accept("application/json")
                .query("num_votes__gte", MIN_NUM_VOTES.to_string())
                .query("ordering", ORDERING);
            if variant == SimilarVariant::Paginated {
                request = request.query("page", page.to_string());
            }

            info!(target: "recommend", game_id, page, "similar_games_request");
            let body = self.http.get(&request)?;
            let parsed: SimilarPage = serde_json::from_str(&body)?;
            let fetched = parsed.results.len();
            accepted.extend(parsed.results.into_iter().filter(|r| r.qualifies(threshold)));
            debug!(target: "recommend", page, fetched, accepted = accepted.len(), has_next = parsed.next.is_some(), "similar_games_page");

            let done = variant == SimilarVariant::SinglePage
                || fetched == 0
                || accepted.len() >= end
                || parsed.next.is_none()
                || page >= query.end;
            if done {
                break;
            }
            page += 1;
        }

        rank(&mut accepted);
        if variant == SimilarVariant::Paginated {
            accepted.truncate(end);
        }
        if let Ok(limit) = usize::try_from(query.limit) {
            if limit > 0 {
                accepted.truncate(limit);
            }
        }
        Ok(accepted.into_iter().map(RecommendRecord::into_similar_game).collect())
    }

    /// `{base}/games/{id}/similar.json`。ID はパスセグメントとしてエンコードする
    fn similar_url(&self, game_id: &str) -> Result<Url, RecommendError> {
        let bad_base = || RecommendError::Url(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| bad_base())?;
        url.path_segments_mut()
            .map_err(|_| bad_base())?
            .pop_if_empty()
            .push("games")
            .push(game_id)
            .push("similar.json");
        Ok(url)
    }
}

/// Stable sort, best first: rec rating, then Bayes rating, then average rating.
/// Missing scores sort after present ones.
pub fn rank(records: &mut [RecommendRecord]) {
    fn desc(a: Option<f64>, b: Option<f64>) -> Ordering {
        let key = |v: Option<f64>| v.filter(|x| !x.is_nan()).unwrap_or(f64::NEG_INFINITY);
        key(b).total_cmp(&key(a))
    }
    records.sort_by(|a, b| {
        desc(a.rec_rating, b.rec_rating)
            .then_with(|| desc(a.bayes_rating, b.bayes_rating))
            .then_with(|| desc(a.avg_rating, b.avg_rating))
    });
}

/// 環境設定からクライアントを作り、1ページ版で推薦を得る。設定エラーも空リスト扱い
pub fn get_similar_games(game_id: &str, limit: i64, block: bool) -> Vec<SimilarGame> {
    match env_client() {
        Some(client) => client.get_similar_games(game_id, limit, block),
        None => Vec::new(),
    }
}

/// 環境設定からクライアントを作り、ページング版で推薦を得る。設定エラーも空リスト扱い
pub fn get_similar_games_v2(game_id: &str, query: SimilarQuery) -> Vec<SimilarGame> {
    match env_client() {
        Some(client) => client.get_similar_games_v2(game_id, query),
        None => Vec::new(),
    }
}

fn env_client() -> Option<RecommendClient> {
    match Config::from_env().and_then(|config| RecommendClient::new(&config)) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(target: "recommend", error = %e, "recommend_client_unavailable");
            None
        }
    }
}
