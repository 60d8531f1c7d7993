//! Tools module aggregator.
//!
//! Each BGG operation is wrapped as a `ToolDefinition` (name, description,
//! JSON Schema parameters, handler) so any function-calling host can list
//! and invoke them. `build_bgg_tools` returns the four tools served together.

mod catalog; // search / details / hot list
mod core; // core definitions: ToolDefinition, ToolParameters, builders
mod dispatch; // ToolCall -> ToolResolution
mod recommend; // similar games

use std::sync::Arc;

use color_eyre::Result;

use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::recommend::RecommendClient;

pub use catalog::{build_game_details_tool, build_hot_games_tool, build_search_tool};
pub use self::core::{ToolDefinition, ToolHandler, ToolParameters, ToolParametersBuilder};
pub use dispatch::{ToolCall, ToolResolution, resolve_and_execute_tool_call};
pub use recommend::build_similar_games_tool;

/// 設定から両クライアントを作り、4つのツールを返す
pub fn build_bgg_tools(config: &Config) -> Result<Vec<ToolDefinition>> {
    let catalog = CatalogClient::new(config)?;
    let recommend = RecommendClient::new(config)?;
    Ok(build_bgg_tools_with(catalog, recommend))
}

/// 既存のクライアントからツール一式を組み立てる。カタログ系3ツールは同じクライアントを共有する
pub fn build_bgg_tools_with(catalog: CatalogClient, recommend: RecommendClient) -> Vec<ToolDefinition> {
    let catalog = Arc::new(catalog);
    vec![
        build_search_tool(Arc::clone(&catalog)),
        build_game_details_tool(Arc::clone(&catalog)),
        build_hot_games_tool(catalog),
        build_similar_games_tool(Arc::new(recommend)),
    ]
}
