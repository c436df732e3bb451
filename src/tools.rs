//! Tool registry and built-in tools.
//!
//! Every capability the server exposes — over plain HTTP and over MCP — is a
//! [`Tool`]: named, described by a JSON Schema, and executed against a
//! [`ToolContext`]. The registry is assembled once at startup.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

use crate::blobstore;
use crate::config::Config;
use crate::federated::{self, SearchScope};
use crate::index;
use crate::query;

/// A tool that agents can discover and call.
///
/// Exposed via `GET /tools/list` for discovery, `POST /tools/{name}` for
/// invocation, and mirrored one-to-one onto MCP `tools/list` / `tools/call`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier used as the route path and MCP tool name.
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters (`type: "object"`).
    fn parameters_schema(&self) -> Value;

    /// Execute with already-validated parameters.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Shared state handed to every tool invocation.
pub struct ToolContext {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, pool: SqlitePool) -> Self {
        Self { config, pool }
    }
}

/// Registry of all callable tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry pre-loaded with every built-in tool.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(AddTool));
        registry.register(Box::new(CalculateTool));
        registry.register(Box::new(SearchTool));
        registry.register(Box::new(GetDocumentTool));
        registry.register(Box::new(ListDocumentsTool));
        registry.register(Box::new(ReindexTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate `params` against a tool's JSON Schema.
///
/// Checks required fields, primitive types, and enum membership, and fills
/// in schema defaults for absent optional parameters. Returns the validated
/// (and default-filled) parameter object.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let params_obj = params
        .as_object()
        .cloned()
        .unwrap_or_default();

    let properties = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let required: Vec<String> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let mut result = params_obj.clone();

    for req_field in &required {
        if !params_obj.contains_key(req_field) {
            bail!("missing required parameter: {}", req_field);
        }
    }

    for (prop_name, prop_schema) in &properties {
        if let Some(value) = params_obj.get(prop_name) {
            if let Some(expected_type) = prop_schema.get("type").and_then(|t| t.as_str()) {
                let type_ok = match expected_type {
                    "string" => value.is_string(),
                    "integer" => value.is_i64() || value.is_u64(),
                    "number" => value.is_number(),
                    "boolean" => value.is_boolean(),
                    "array" => value.is_array(),
                    "object" => value.is_object(),
                    _ => true,
                };
                if !type_ok {
                    bail!(
                        "parameter '{}' must be of type '{}', got {}",
                        prop_name,
                        expected_type,
                        json_type_name(value)
                    );
                }
            }

            if let Some(enum_values) = prop_schema.get("enum").and_then(|e| e.as_array()) {
                if !enum_values.contains(value) {
                    let allowed: Vec<String> = enum_values.iter().map(|v| v.to_string()).collect();
                    bail!(
                        "parameter '{}' must be one of [{}], got {}",
                        prop_name,
                        allowed.join(", "),
                        value
                    );
                }
            }
        } else if let Some(default) = prop_schema.get("default") {
            result.insert(prop_name.clone(), default.clone());
        }
    }

    Ok(Value::Object(result))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in tools
// ═══════════════════════════════════════════════════════════════════════

/// Adds two numbers.
pub struct AddTool;

#[async_trait]
impl Tool for AddTool {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Add two numbers"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "number", "description": "First number" },
                "b": { "type": "number", "description": "Second number" }
            },
            "required": ["a", "b"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        let a = number_param(&params, "a")?;
        let b = number_param(&params, "b")?;
        Ok(json!({ "result": a + b }))
    }
}

/// Four-function calculator.
pub struct CalculateTool;

#[async_trait]
impl Tool for CalculateTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Perform basic arithmetic on two numbers"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["add", "subtract", "multiply", "divide"],
                    "description": "Arithmetic operation to perform"
                },
                "a": { "type": "number", "description": "First operand" },
                "b": { "type": "number", "description": "Second operand" }
            },
            "required": ["operation", "a", "b"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        let a = number_param(&params, "a")?;
        let b = number_param(&params, "b")?;
        let operation = params["operation"].as_str().unwrap_or("");

        let result = match operation {
            "add" => a + b,
            "subtract" => a - b,
            "multiply" => a * b,
            "divide" => {
                if b == 0.0 {
                    bail!("Cannot divide by zero");
                }
                a / b
            }
            other => bail!("Unknown operation: '{}'", other),
        };

        Ok(json!({ "operation": operation, "result": result }))
    }
}

/// Federated search across the content API and the local index.
pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the remote content API and the local document index by keyword"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keywords": { "type": "string", "description": "Search keywords" },
                "scope": {
                    "type": "string",
                    "enum": ["all", "content", "index"],
                    "default": "all",
                    "description": "Which sources to consult"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Per-source result cap (1-10)"
                }
            },
            "required": ["keywords"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let keywords = params["keywords"].as_str().unwrap_or("");
        let scope = SearchScope::from_str(params["scope"].as_str().unwrap_or("all"))?;
        let max_results = params["max_results"].as_i64();

        let response =
            federated::federated_search(&ctx.config, &ctx.pool, keywords, scope, max_results)
                .await?;
        Ok(serde_json::to_value(&response)?)
    }
}

/// Full document retrieval by key.
pub struct GetDocumentTool;

#[async_trait]
impl Tool for GetDocumentTool {
    fn name(&self) -> &str {
        "get_document"
    }

    fn description(&self) -> &str {
        "Retrieve an indexed document's metadata and raw body by key"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "key": { "type": "string", "description": "Document key (filename stem)" }
            },
            "required": ["key"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let key = params["key"].as_str().unwrap_or("").trim();
        if key.is_empty() {
            bail!("key must not be empty");
        }

        let store = blobstore::open_blob_store(&ctx.config)?;
        let view = federated::get_document(&ctx.pool, store.as_ref(), key).await?;
        Ok(serde_json::to_value(&view)?)
    }
}

/// Index listing without a keyword filter.
pub struct ListDocumentsTool;

#[async_trait]
impl Tool for ListDocumentsTool {
    fn name(&self) -> &str {
        "list_documents"
    }

    fn description(&self) -> &str {
        "List index records, oldest first, optionally filtered by keyword"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keywords": { "type": "string", "description": "Optional keyword filter" },
                "limit": { "type": "integer", "description": "Max records (1-50)" }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let keywords = params["keywords"].as_str();
        let limit = params["limit"]
            .as_i64()
            .or(Some(ctx.config.query.default_limit));
        let records = query::query_records(&ctx.pool, keywords, limit).await?;
        Ok(json!({ "count": records.len(), "documents": records }))
    }
}

/// Trigger an index run over the configured blob store.
pub struct ReindexTool;

#[async_trait]
impl Tool for ReindexTool {
    fn name(&self) -> &str {
        "reindex"
    }

    fn description(&self) -> &str {
        "Re-scan the blob store and reconcile the document index"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": { "type": "integer", "description": "Max documents to process" }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let limit = params["limit"].as_i64().map(|l| l.max(0) as usize);
        let store = blobstore::open_blob_store(&ctx.config)?;
        let report =
            index::index_documents(&ctx.pool, store.as_ref(), &ctx.config.blobs.prefix, limit)
                .await?;
        Ok(serde_json::to_value(&report)?)
    }
}

fn number_param(params: &Value, name: &str) -> Result<f64> {
    params[name]
        .as_f64()
        .ok_or_else(|| anyhow::anyhow!("parameter '{}' must be a number", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlobsConfig, DbConfig, FsBlobConfig, ServerConfig};
    use crate::migrate;

    async fn test_ctx(dir: &std::path::Path) -> ToolContext {
        let config = Config {
            db: DbConfig {
                path: dir.join("test.db"),
            },
            blobs: BlobsConfig {
                binding: "fs".to_string(),
                prefix: "docs/".to_string(),
                fs: Some(FsBlobConfig {
                    root: dir.join("blobs"),
                    exclude_globs: vec![],
                }),
                s3: None,
            },
            content_api: None,
            query: Default::default(),
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
            },
        };
        let pool = crate::db::connect_path(&config.db.path).await.unwrap();
        migrate::apply_schema(&pool).await.unwrap();
        ToolContext::new(Arc::new(config), pool)
    }

    #[tokio::test]
    async fn test_add_tool() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ctx = test_ctx(tmp.path()).await;

        let out = AddTool
            .execute(json!({ "a": 2, "b": 3.5 }), &ctx)
            .await
            .unwrap();
        assert_eq!(out["result"], json!(5.5));
    }

    #[tokio::test]
    async fn test_calculate_operations() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ctx = test_ctx(tmp.path()).await;

        let cases = [
            ("add", 7.0),
            ("subtract", 3.0),
            ("multiply", 10.0),
            ("divide", 2.5),
        ];
        for (op, expected) in cases {
            let out = CalculateTool
                .execute(json!({ "operation": op, "a": 5, "b": 2 }), &ctx)
                .await
                .unwrap();
            assert_eq!(out["result"], json!(expected), "operation {}", op);
        }
    }

    #[tokio::test]
    async fn test_divide_by_zero_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ctx = test_ctx(tmp.path()).await;

        let err = CalculateTool
            .execute(json!({ "operation": "divide", "a": 1, "b": 0 }), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("divide by zero"));
    }

    #[tokio::test]
    async fn test_reindex_then_list() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ctx = test_ctx(tmp.path()).await;

        std::fs::create_dir_all(tmp.path().join("blobs/docs")).unwrap();
        std::fs::write(
            tmp.path().join("blobs/docs/guide.md"),
            "# Guide\n\nHello.\n",
        )
        .unwrap();

        let report = ReindexTool.execute(json!({}), &ctx).await.unwrap();
        assert_eq!(report["indexed"], json!(1));
        assert_eq!(report["total"], json!(1));

        let listed = ListDocumentsTool.execute(json!({}), &ctx).await.unwrap();
        assert_eq!(listed["count"], json!(1));
        assert_eq!(listed["documents"][0]["key"], json!("guide"));
    }

    #[test]
    fn test_registry_contains_builtins() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(registry.len(), 6);
        for name in ["add", "calculate", "search", "get_document", "list_documents", "reindex"] {
            assert!(registry.find(name).is_some(), "missing tool {}", name);
        }
        assert!(registry.find("unknown").is_none());
    }

    #[test]
    fn test_validate_params_required_and_types() {
        let schema = CalculateTool.parameters_schema();

        let err = validate_params(&schema, &json!({ "a": 1, "b": 2 })).unwrap_err();
        assert!(err.to_string().contains("missing required parameter"));

        let err =
            validate_params(&schema, &json!({ "operation": "add", "a": "one", "b": 2 }))
                .unwrap_err();
        assert!(err.to_string().contains("must be of type 'number'"));

        let err =
            validate_params(&schema, &json!({ "operation": "modulo", "a": 1, "b": 2 }))
                .unwrap_err();
        assert!(err.to_string().contains("must be one of"));
    }

    #[test]
    fn test_validate_params_fills_defaults() {
        let schema = SearchTool.parameters_schema();
        let validated = validate_params(&schema, &json!({ "keywords": "rust" })).unwrap();
        assert_eq!(validated["scope"], json!("all"));
        assert!(validated.get("max_results").is_none());
    }
}
