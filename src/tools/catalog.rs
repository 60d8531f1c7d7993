//! BoardGameGeek catalog tools: search, details and the hot list.
//!
//! Failures are returned as errors from the handler so the caller sees them
//! as `ToolResolution::ExecutionError`.

use std::sync::Arc;

use color_eyre::{Result, eyre::{WrapErr, eyre}};
use serde_json::Value;

use crate::catalog::{CatalogClient, GameIds};
use crate::tools::{ToolDefinition, ToolParametersBuilder};

pub fn build_search_tool(client: Arc<CatalogClient>) -> ToolDefinition {
    let parameters = ToolParametersBuilder::new_object()
        .add_string("query", Some("The name (or partial name) of the board game to search for"))
        .required("query")
        .additional_properties(false)
        .build();

    ToolDefinition::new(
        "search",
        "Search BoardGameGeek for base board games by title. Returns a list of {id, title, year}.",
        parameters,
        Arc::new(move |args: &Value| -> Result<Value> {
            let query = match args.get("query").and_then(|v| v.as_str()) {
                Some(s) if !s.trim().is_empty() => s.trim(),
                _ => return Err(eyre!("query is required string")),
            };
            let results = client
                .search(query)
                .wrap_err_with(|| format!("searching BoardGameGeek for {query:?}"))?;
            Ok(serde_json::to_value(results)?)
        }),
    )
}

pub fn build_game_details_tool(client: Arc<CatalogClient>) -> ToolDefinition {
    let parameters = ToolParametersBuilder::new_object()
        .add_string_or_array("ids", Some("BoardGameGeek id, comma-separated ids, or a list of ids"))
        .required("ids")
        .additional_properties(false)
        .build();

    ToolDefinition::new(
        "get_game_details",
        "Get detailed information (players, playing time, rating, complexity, categories, mechanics) for one or more board games.",
        parameters,
        Arc::new(move |args: &Value| -> Result<Value> {
            let ids = game_ids_arg(args.get("ids"))?;
            let details = client
                .get_game_details(ids.clone())
                .wrap_err_with(|| format!("fetching details for ids {}", ids.joined()))?;
            Ok(serde_json::to_value(details)?)
        }),
    )
}

pub fn build_hot_games_tool(client: Arc<CatalogClient>) -> ToolDefinition {
    let parameters = ToolParametersBuilder::new_object().additional_properties(false).build();

    ToolDefinition::new(
        "get_hot_games",
        "Get the top 50 trending board games on BoardGameGeek today, in rank order.",
        parameters,
        Arc::new(move |_args: &Value| -> Result<Value> {
            let hot = client.get_hot_games().wrap_err("fetching BoardGameGeek hot list")?;
            Ok(serde_json::to_value(hot)?)
        }),
    )
}

/// 文字列 (カンマ区切り可) / 文字列・数値の配列 / 数値 のいずれかから ID 群を作る
fn game_ids_arg(value: Option<&Value>) -> Result<GameIds> {
    let ids = match value {
        Some(Value::String(s)) => GameIds::from(s.as_str()),
        Some(Value::Number(n)) => GameIds::from(n.to_string()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(eyre!("ids entries must be strings, got {other}")),
            })
            .collect::<Result<Vec<String>>>()?
            .into(),
        _ => return Err(eyre!("ids is required (string or array of strings)")),
    };
    if ids.is_empty() {
        return Err(eyre!("ids must contain at least one id"));
    }
    Ok(ids)
}
