use std::sync::Arc;

use color_eyre::{Result, eyre::eyre};
use serde_json::Value;

use crate::recommend::{RecommendClient, SimilarQuery};
use crate::tools::{ToolDefinition, ToolParametersBuilder};

/// 類似ゲーム推薦ツール。ページング版を使う。
/// 上流が失敗しても空配列を返すので、エラーになるのは引数不正のときだけ。
pub fn build_similar_games_tool(client: Arc<RecommendClient>) -> ToolDefinition {
    let parameters = ToolParametersBuilder::new_object()
        .add_string("game_id", Some("BoardGameGeek id of the game to find similar games for"))
        .add_integer_unbounded("limit", Some("Maximum number of games to return (default 5, 0 or negative for no limit)"))
        .add_integer("start", Some("Zero-based page offset (default 0)"), Some(0), None)
        .add_integer("end", Some("Upper bound on collected results and pages (default 25)"), Some(1), None)
        .add_boolean("block", Some("Wait without a request timeout (default false)"))
        .required("game_id")
        .additional_properties(false)
        .build();

    ToolDefinition::new(
        "get_similar_games",
        "Get a list of board games similar to the given BoardGameGeek id, ranked by recommendation score.",
        parameters,
        Arc::new(move |args: &Value| -> Result<Value> {
            let game_id = match args.get("game_id") {
                Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                _ => return Err(eyre!("game_id is required string")),
            };
            let query = similar_query(args)?;
            let games = client.get_similar_games_v2(&game_id, query);
            Ok(serde_json::to_value(games)?)
        }),
    )
}

fn similar_query(args: &Value) -> Result<SimilarQuery> {
    let defaults = SimilarQuery::default();
    let limit = match args.get("limit") {
        None | Some(Value::Null) => defaults.limit,
        Some(v) => v.as_i64().ok_or_else(|| eyre!("limit must be an integer"))?,
    };
    let start = u32_arg(args, "start")?.unwrap_or(defaults.start);
    let end = u32_arg(args, "end")?.unwrap_or(defaults.end);
    let block = match args.get("block") {
        None | Some(Value::Null) => defaults.block,
        Some(v) => v.as_bool().ok_or_else(|| eyre!("block must be a boolean"))?,
    };
    Ok(SimilarQuery { limit, start, end, block })
}

fn u32_arg(args: &Value, key: &str) -> Result<Option<u32>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| eyre!("{key} must be a non-negative integer")),
    }
}
