use std::fmt::{self, Display};

use serde_json::Value;
use tracing::{debug, instrument};

use crate::tools::ToolDefinition;

/// ホスト側から届いたツール呼び出し (名前 + 引数JSON文字列)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self { name: name.into(), arguments: arguments.into() }
    }
}

/// ツール呼び出しを実際に実行した結果
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResolution {
    /// ツールが存在し、引数JSONがパースされ、正常実行された: name と結果JSON
    Executed { name: String, result: Value },
    /// ツール名が一致しなかった
    ToolNotFound { requested: String },
    /// 引数JSONのパースに失敗
    ArgumentsParseError { name: String, raw: String, error: String },
    /// 実行中に handler がエラーを返した
    ExecutionError { name: String, error: String },
}

impl ToolResolution {
    /// 実行成功か判定用ヘルパ
    pub fn is_executed(&self) -> bool {
        matches!(self, ToolResolution::Executed { .. })
    }
}

impl Display for ToolResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolResolution::Executed { name, result } => {
                write!(f, "Executed name={} result={} (json)", name, result)
            }
            ToolResolution::ToolNotFound { requested } => write!(f, "ToolNotFound requested={}", requested),
            ToolResolution::ArgumentsParseError { name, raw, error } => {
                write!(f, "ArgumentsParseError name={} error={} raw={}", name, error, raw)
            }
            ToolResolution::ExecutionError { name, error } => {
                write!(f, "ExecutionError name={} error={}", name, error)
            }
        }
    }
}

/// `ToolCall` を利用可能な `ToolDefinition` の集合に対して解決し、実行して `ToolResolution` を返す。
/// ツール検索→JSONパース→execute の順。空の引数文字列は `{}` とみなす。
/// 失敗時も panic せず詳細を enum で表現。
#[instrument(name = "resolve_tool_call", skip(tools), fields(tool = %call.name))]
pub fn resolve_and_execute_tool_call(call: ToolCall, tools: &[ToolDefinition]) -> ToolResolution {
    let ToolCall { name, arguments } = call;
    let tool = match tools.iter().find(|d| d.name == name) {
        Some(t) => t,
        None => return ToolResolution::ToolNotFound { requested: name },
    };
    let raw = if arguments.trim().is_empty() { "{}" } else { arguments.as_str() };
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            return ToolResolution::ArgumentsParseError {
                name: tool.name.to_string(),
                raw: arguments,
                error: e.to_string(),
            };
        }
    };
    let resolution = match tool.execute(&parsed) {
        Ok(v) => ToolResolution::Executed { name: tool.name.to_string(), result: v },
        Err(e) => {
            // 原因チェーンまで含めて返す
            let error = e.chain().map(|c| c.to_string()).collect::<Vec<_>>().join(": ");
            ToolResolution::ExecutionError { name: tool.name.to_string(), error }
        }
    };
    debug!(target: "tools", executed = resolution.is_executed(), "tool_resolved");
    resolution
}
