use std::sync::Arc;

use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use color_eyre::Result;
use serde_json::{Map, Value, json};

/// ランタイムで実行するツール関数の型。
/// 引数(JSON)を受け取り、結果(JSON)を返す。
pub type ToolHandler = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync + 'static>;

/// JSON Schema (object) で表したツール引数定義
#[derive(Debug, Clone, PartialEq)]
pub struct ToolParameters(Value);

impl ToolParameters {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// `ToolParameters` を組み立てるビルダー
#[derive(Debug, Default)]
pub struct ToolParametersBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
    additional_properties: Option<bool>,
}

impl ToolParametersBuilder {
    pub fn new_object() -> Self {
        Self::default()
    }

    fn property(mut self, name: &str, mut schema: Value, description: Option<&str>) -> Self {
        if let (Some(d), Some(obj)) = (description, schema.as_object_mut()) {
            obj.insert("description".into(), json!(d));
        }
        self.properties.insert(name.to_string(), schema);
        self
    }

    pub fn add_string(self, name: &str, description: Option<&str>) -> Self {
        self.property(name, json!({ "type": "string" }), description)
    }

    /// 最小値・最大値つきの整数
    pub fn add_integer(self, name: &str, description: Option<&str>, min: Option<i64>, max: Option<i64>) -> Self {
        let mut schema = json!({ "type": "integer" });
        if let Some(min) = min {
            schema["minimum"] = json!(min);
        }
        if let Some(max) = max {
            schema["maximum"] = json!(max);
        }
        self.property(name, schema, description)
    }

    pub fn add_integer_unbounded(self, name: &str, description: Option<&str>) -> Self {
        self.add_integer(name, description, None, None)
    }

    pub fn add_boolean(self, name: &str, description: Option<&str>) -> Self {
        self.property(name, json!({ "type": "boolean" }), description)
    }

    /// 文字列1つ、または文字列の配列のどちらでも受け付ける
    pub fn add_string_or_array(self, name: &str, description: Option<&str>) -> Self {
        let schema = json!({
            "anyOf": [
                { "type": "string" },
                { "type": "array", "items": { "type": "string" } }
            ]
        });
        self.property(name, schema, description)
    }

    pub fn required(mut self, name: &str) -> Self {
        if !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = Some(allowed);
        self
    }

    pub fn build(self) -> ToolParameters {
        let mut schema = json!({
            "type": "object",
            "properties": Value::Object(self.properties),
            "required": self.required,
        });
        if let Some(allowed) = self.additional_properties {
            schema["additionalProperties"] = json!(allowed);
        }
        ToolParameters(schema)
    }
}

/// function calling に渡すメタデータと実行ハンドラをまとめた定義。
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: ToolParameters,
    pub strict: bool,
    handler: ToolHandler,
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("strict", &self.strict)
            .finish()
    }
}

impl ToolDefinition {
    /// 新規作成
    pub fn new(
        name: &'static str,
        description: &'static str,
        parameters: ToolParameters,
        handler: ToolHandler,
    ) -> Self {
        Self { name, description, parameters, strict: false, handler }
    }

    /// OpenAI SDK の `FunctionObject` に変換
    pub fn function_object(&self) -> FunctionObject {
        FunctionObject {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            parameters: Some(self.parameters.as_value().clone()),
            strict: Some(self.strict),
        }
    }

    /// ChatCompletionTool 形式（APIへ渡す vector 用）
    pub fn as_chat_tool(&self) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: self.function_object(),
        }
    }

    /// ツールを実行
    pub fn execute(&self, args: &Value) -> Result<Value> {
        (self.handler)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definition_executes_closure() -> Result<()> {
        let params = ToolParametersBuilder::new_object()
            .add_string("payload", Some("Any text"))
            .required("payload")
            .build();
        let tool = ToolDefinition::new(
            "echo_len",
            "Return the length of payload",
            params,
            Arc::new(|v| {
                let s = v
                    .get("payload")
                    .and_then(|p| p.as_str())
                    .ok_or_else(|| color_eyre::eyre::eyre!("missing payload"))?;
                Ok(json!({ "len": s.len() }))
            }),
        );

        let out = tool.execute(&json!({"payload": "abc"}))?;
        assert_eq!(out["len"], 3);
        assert!(tool.execute(&json!({})).is_err());

        let chat_tool = tool.as_chat_tool();
        assert_eq!(chat_tool.function.name, "echo_len");
        assert_eq!(chat_tool.function.strict, Some(false));
        Ok(())
    }

    #[test]
    fn builder_produces_json_schema() {
        let params = ToolParametersBuilder::new_object()
            .add_string("query", Some("Search text"))
            .add_integer("limit", None, Some(0), Some(100))
            .add_boolean("block", Some("Wait forever"))
            .add_string_or_array("ids", None)
            .required("query")
            .required("query")
            .additional_properties(false)
            .build();
        let v = params.as_value();
        assert_eq!(v["type"], "object");
        assert_eq!(v["properties"]["query"]["description"], "Search text");
        assert_eq!(v["properties"]["limit"]["minimum"], 0);
        assert_eq!(v["properties"]["limit"]["maximum"], 100);
        assert_eq!(v["properties"]["block"]["type"], "boolean");
        assert_eq!(v["properties"]["ids"]["anyOf"][1]["type"], "array");
        assert_eq!(v["required"], json!(["query"]));
        assert_eq!(v["additionalProperties"], false);
    }

    #[test]
    fn empty_object_has_no_required_fields() {
        let v = ToolParametersBuilder::new_object().build().into_value();
        assert_eq!(v["properties"], json!({}));
        assert_eq!(v["required"], json!([]));
        assert!(v.get("additionalProperties").is_none());
    }
}
