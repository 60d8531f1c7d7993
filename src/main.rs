use bgg_tools::{Config, ToolCall, ToolDefinition, ToolResolution, build_bgg_tools, resolve_and_execute_tool_call};
use color_eyre::{Result, eyre::eyre};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    color_eyre::install()?;

    // Load .env (optional). This allows overriding API base URLs and timeouts from a local .env file.
    // If the file doesn't exist, ignore the error.
    let _ = dotenvy::dotenv();

    // ログ: 標準出力はツール結果(JSON)専用にし、ログはファイルへのみ出力する
    let file_appender = rolling::daily("logs", "bgg_tools.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    // _guard はdropするとログが失われるため、main の終わりまで保持する

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // ファイルにANSIカラー不要
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_env()?;
    let tools = build_bgg_tools(&config)?;
    tracing::info!(tools = tools.len(), "bgg_tools started");

    match args.first().map(String::as_str) {
        None | Some("-h" | "--help" | "help") => {
            print_usage(&tools);
            Ok(())
        }
        Some("list") => {
            let schemas: Vec<_> = tools.iter().map(ToolDefinition::as_chat_tool).collect();
            println!("{}", serde_json::to_string_pretty(&schemas)?);
            Ok(())
        }
        Some(name) => {
            // 引数JSONは残りの引数を空白で連結したもの (省略時は {})
            let arguments = args[1..].join(" ");
            match resolve_and_execute_tool_call(ToolCall::new(name, arguments), &tools) {
                ToolResolution::Executed { result, .. } => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                    Ok(())
                }
                other => {
                    tracing::error!(%other, "tool call failed");
                    Err(eyre!("{other}"))
                }
            }
        }
    }
}

fn print_usage(tools: &[ToolDefinition]) {
    println!("usage: bgg_tools list");
    println!("       bgg_tools <tool> ['<json arguments>']");
    println!();
    println!("tools:");
    for tool in tools {
        println!("  {:<18} {}", tool.name, tool.description);
    }
    println!();
    println!(r#"example: bgg_tools search '{{"query": "Catan"}}'"#);
}
