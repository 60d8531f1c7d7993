//! カタログAPIから組み立てるレコード型

use serde::Serialize;

/// 値が無いスカラー項目の既定値
pub const UNKNOWN: &str = "Unknown";

/// 検索結果 1 件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub year: String,
}

/// `thing` エンドポイントの 1 アイテム分の詳細
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub year: String,
    pub min_players: String,
    pub max_players: String,
    pub playing_time: String,
    pub complexity: Option<String>,
    pub rating: Option<String>,
    pub categories: Vec<String>,
    pub mechanics: Vec<String>,
}

/// hot リストの 1 件。rank は上流の値をそのまま使う
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotGame {
    pub id: String,
    pub title: String,
    pub rank: String,
    pub year: String,
    pub url: String,
}

/// 詳細取得に渡すゲームID群。
///
/// 単一ID・カンマ区切り文字列・コレクションのどれからでも作れる。
/// `GameIds::from("1")` と `GameIds::from(vec!["1"])` は同じ値になる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameIds(Vec<String>);

impl GameIds {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 上流へ渡す `id` パラメータ (カンマ区切り)
    pub fn joined(&self) -> String {
        self.0.join(",")
    }

    fn push_split(&mut self, raw: &str) {
        self.0.extend(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }
}

impl From<&str> for GameIds {
    fn from(raw: &str) -> Self {
        let mut ids = Self::default();
        ids.push_split(raw);
        ids
    }
}

impl From<String> for GameIds {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl<S: AsRef<str>> From<Vec<S>> for GameIds {
    fn from(items: Vec<S>) -> Self {
        Self::from_iter(items)
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for GameIds {
    fn from(items: [S; N]) -> Self {
        Self::from_iter(items)
    }
}

impl<S: AsRef<str>> FromIterator<S> for GameIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut ids = Self::default();
        for item in iter {
            ids.push_split(item.as_ref());
        }
        ids
    }
}
