//! アプリケーション設定と定数

use color_eyre::{Result, eyre::eyre};

/// hot リストとして返す最大件数
pub const HOT_GAMES_LIMIT: usize = 50;

/// 推薦結果として採用する最小投票数
pub const MIN_NUM_VOTES: u64 = 30;

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// BoardGameGeek XML API 2 のベースURL
    pub catalog_base_url: String,
    /// ゲーム詳細ページ URL の組み立てに使うサイトURL
    pub site_url: String,
    /// recommend.games API のベースURL
    pub recommend_base_url: String,
    /// カタログAPIのタイムアウト（秒）
    pub catalog_timeout_secs: u64,
    /// 推薦APIのタイムアウト（秒）。`block` 指定時は無効化される
    pub recommend_timeout_secs: u64,
    /// User-Agent ヘッダ
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_base_url: "https://boardgamegeek.com/xmlapi2".to_string(),
            site_url: "https://boardgamegeek.com".to_string(),
            recommend_base_url: "https://recommend.games/api".to_string(),
            // NOTE: Keep in sync with tests (tests/config_tests.rs).
            catalog_timeout_secs: 20,
            recommend_timeout_secs: 10,
            user_agent: "bgg_tools/0.1".to_string(),
        }
    }
}

impl Config {
    /// 新しい設定インスタンスを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 環境変数 (.env を含む) から設定を読み込む。未設定の項目は既定値のまま。
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `lookup` で得た値で既定値を上書きする。テストでは環境変数を汚さずに使える。
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = non_empty("BGG_BASE_URL") {
            config.catalog_base_url = trim_slash(v);
        }
        if let Some(v) = non_empty("BGG_SITE_URL") {
            config.site_url = trim_slash(v);
        }
        if let Some(v) = non_empty("RECOMMEND_BASE_URL") {
            config.recommend_base_url = trim_slash(v);
        }
        if let Some(v) = non_empty("BGG_TIMEOUT_SECS") {
            config.catalog_timeout_secs = parse_secs("BGG_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = non_empty("RECOMMEND_TIMEOUT_SECS") {
            config.recommend_timeout_secs = parse_secs("RECOMMEND_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = non_empty("BGG_TOOLS_USER_AGENT") {
            config.user_agent = v;
        }
        Ok(config)
    }
}

fn trim_slash(v: String) -> String {
    v.trim_end_matches('/').to_string()
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    match raw.parse::<u64>() {
        Ok(0) => Err(eyre!("{key} must be greater than zero")),
        Ok(secs) => Ok(secs),
        Err(e) => Err(eyre!("{key}={raw} is not a valid number of seconds: {e}")),
    }
}
