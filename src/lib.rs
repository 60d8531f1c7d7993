//! bgg_tools
//!
//! BoardGameGeek のカタログAPIと recommend.games の推薦APIを、
//! 関数呼び出し可能な「ツール」としてまとめて公開するクレート。

pub mod catalog; // BoardGameGeek XML API 2 client
pub mod config;
pub mod http; // blocking HTTP seam shared by both clients
pub mod recommend; // recommend.games client (filter / rank / paginate)
pub mod tools; // ToolDefinition wrappers + dispatch

pub use catalog::{CatalogClient, CatalogError, GameDetail, GameIds, HotGame, SearchResult};
pub use config::Config;
pub use recommend::{RecommendClient, SimilarGame, SimilarQuery};
pub use tools::{ToolCall, ToolDefinition, ToolResolution, build_bgg_tools, resolve_and_execute_tool_call};

// Ensure .env is loaded for tests before anything else runs in the test process.
#[cfg(test)]
#[ctor::ctor]
fn load_dotenv_for_tests() {
    let _ = dotenvy::dotenv();
}
