//! MCP tool definitions for the memquery server.

use crate::config::ServerConfig;
use crate::query::error::{QueryError, QueryResult};
use crate::query::QueryEngine;
use crate::server::types::*;
use rmcp::handler::server::{router::tool::ToolRouter, wrapper::Parameters};
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The memquery MCP server.
#[derive(Clone)]
pub struct MemQueryServer {
    engine: Arc<QueryEngine>,
    config: ServerConfig,
    tool_router: ToolRouter<Self>,
}

/// Build the JSON envelope for a query outcome. The flag is true for errors.
pub fn envelope<T: Serialize>(result: QueryResult<T>) -> (serde_json::Value, bool) {
    let result = result.and_then(|value| {
        serde_json::to_value(value)
            .map_err(|e| QueryError::BackendFailure(format!("cannot encode result: {}", e)))
    });
    match result {
        Ok(value) => (json!({ "status": "ok", "value": value }), false),
        Err(e) => (
            json!({ "status": "error", "kind": e.kind(), "message": e.to_string() }),
            true,
        ),
    }
}

fn render<T: Serialize>(result: QueryResult<T>) -> CallToolResult {
    let (body, is_error) = envelope(result);
    let content = vec![Content::text(body.to_string())];
    if is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl MemQueryServer {
    /// Run a blocking query on the blocking pool, bounded by `limit`.
    ///
    /// On expiry the worker keeps running to completion and its result is dropped.
    async fn run_blocking<T, F>(&self, limit: Option<Duration>, query: F) -> QueryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&QueryEngine) -> QueryResult<T> + Send + 'static,
    {
        let engine = self.engine.clone();
        let task = tokio::task::spawn_blocking(move || query(&engine));

        let joined = match limit {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("query exceeded {:?}", limit);
                    return Err(QueryError::Timeout(limit));
                }
            },
            None => task.await,
        };

        joined.unwrap_or_else(|e| Err(QueryError::BackendFailure(format!("query task failed: {}", e))))
    }
}

#[tool_router]
impl MemQueryServer {
    pub fn new(engine: Arc<QueryEngine>, config: ServerConfig) -> Self {
        MemQueryServer {
            engine,
            config,
            tool_router: Self::tool_router(),
        }
    }

    /// Read a process attribute.
    #[tool(description = "Read an attribute of a process in a memory image. Fields: mempath (image path), process_name (e.g. \"explorer.exe\", first match wins), attributes (dotted path such as \"pid\", \"ppid\", \"cmdline\", \"sid\", \"maps\"; a leading \"process.\" is accepted), timeout_secs (optional).")]
    async fn get_process_attribute(
        &self,
        Parameters(req): Parameters<ProcessAttributeRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("get_process_attribute: {} '{}' {}", req.mempath, req.process_name, req.attributes);
        let limit = self.config.effective_timeout(req.timeout_secs);
        let result = self
            .run_blocking(limit, move |engine| {
                engine.get_process_attribute(&req.mempath, &req.process_name, &req.attributes)
            })
            .await;
        Ok(render(result))
    }

    /// Read a registry hive attribute.
    #[tool(description = "Read an attribute of a registry hive in a memory image. Fields: mempath, hive_identifier (zero-based index as integer or decimal string, \"0x\" hive address, or hive name/path), attributes (\"name\", \"name_short\", \"path\", \"size\", \"addr\", \"addr_baseblock\", \"rootkey.name\", \"orphankey\", \"memory\"), timeout_secs (optional). Use get_reghive_list to see the indexes.")]
    async fn get_reghive_attribute(
        &self,
        Parameters(req): Parameters<RegHiveAttributeRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("get_reghive_attribute: {} '{}' {}", req.mempath, req.hive_identifier, req.attributes);
        let limit = self.config.effective_timeout(req.timeout_secs);
        let identifier = req.hive_identifier.to_string();
        let result = self
            .run_blocking(limit, move |engine| {
                engine.get_reghive_attribute(&req.mempath, &identifier, &req.attributes)
            })
            .await;
        Ok(render(result))
    }

    /// Read a registry key attribute.
    #[tool(description = "Read an attribute of a registry key in a memory image. Fields: mempath, key_path (e.g. \"HKLM\\\\SOFTWARE\\\\Microsoft\\\\Windows\\\\CurrentVersion\\\\Run\"), attributes (\"name\", \"path\", \"time_int\", \"time_str\", \"parent.name\", or the final accessors \"values()\" / \"values_dict()\"), timeout_secs (optional).")]
    async fn get_regkey_attribute(
        &self,
        Parameters(req): Parameters<RegKeyAttributeRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("get_regkey_attribute: {} '{}' {}", req.mempath, req.key_path, req.attributes);
        let limit = self.config.effective_timeout(req.timeout_secs);
        let result = self
            .run_blocking(limit, move |engine| {
                engine.get_regkey_attribute(&req.mempath, &req.key_path, &req.attributes)
            })
            .await;
        Ok(render(result))
    }

    /// Read a registry value attribute.
    #[tool(description = "Read an attribute of a registry value in a memory image. Fields: mempath, value_path (key path, backslash, value name), attributes (\"name\", \"path\", \"size\", \"type\", \"value\" as a hex payload, \"parent.name\"), timeout_secs (optional).")]
    async fn get_regvalue_attribute(
        &self,
        Parameters(req): Parameters<RegValueAttributeRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("get_regvalue_attribute: {} '{}' {}", req.mempath, req.value_path, req.attributes);
        let limit = self.config.effective_timeout(req.timeout_secs);
        let result = self
            .run_blocking(limit, move |engine| {
                engine.get_regvalue_attribute(&req.mempath, &req.value_path, &req.attributes)
            })
            .await;
        Ok(render(result))
    }

    /// List registry hives.
    #[tool(description = "List the registry hives of a memory image in enumeration order. Each entry has index, name, name_short, path, size, addr and addr_baseblock; index and addr are valid hive identifiers.")]
    async fn get_reghive_list(
        &self,
        Parameters(req): Parameters<RegHiveListRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("get_reghive_list: {}", req.mempath);
        let limit = self.config.effective_timeout(req.timeout_secs);
        let result = self
            .run_blocking(limit, move |engine| engine.list_reghives(&req.mempath))
            .await;
        Ok(render(result))
    }
}

#[tool_handler]
impl ServerHandler for MemQueryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "memquery: attribute queries over processes and registry objects of memory images. \
                 Every tool takes mempath; the image is opened on first use and reused afterwards.\n\
                 Start with get_reghive_list to see hive indexes and addresses.\n\
                 Attribute paths are dotted names, e.g. \"pid\", \"rootkey.name\", \"parent.parent.path\", \"values_dict()\".\n\
                 Results are JSON: {\"status\":\"ok\",\"value\":...} or {\"status\":\"error\",\"kind\":...,\"message\":...}."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::session::SessionCache;
    use crate::query::value::AttrValue;
    use crate::testing::CountingBackend;

    const IMAGE: &str = "/evidence/win10.raw";

    fn server(backend: CountingBackend, config: ServerConfig) -> MemQueryServer {
        let sessions = Arc::new(SessionCache::new(Arc::new(backend)));
        MemQueryServer::new(Arc::new(QueryEngine::new(sessions)), config)
    }

    #[test]
    fn test_envelope_ok() {
        let (body, is_error) = envelope(Ok(AttrValue::Int(4280)));
        assert!(!is_error);
        assert_eq!(body, json!({ "status": "ok", "value": 4280 }));
    }

    #[test]
    fn test_envelope_error() {
        let (body, is_error) =
            envelope::<AttrValue>(Err(QueryError::NotFound("process 'missingproc.exe' not found".to_string())));
        assert!(is_error);
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "NotFound");
        assert_eq!(body["message"], "process 'missingproc.exe' not found");
    }

    #[test]
    fn test_envelope_string_value_is_not_an_error() {
        let (body, is_error) = envelope(Ok(AttrValue::Str("Error: not really".to_string())));
        assert!(!is_error);
        assert_eq!(body["status"], "ok");
    }

    #[test]
    fn test_render_sets_error_flag() {
        let ok = render(Ok(AttrValue::Bool(true)));
        assert_ne!(ok.is_error, Some(true));
        let err = render::<AttrValue>(Err(QueryError::invalid_attribute("pid()", "not callable")));
        assert_eq!(err.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_query_through_blocking_pool() {
        let server = server(CountingBackend::new(&[IMAGE]), ServerConfig::default());
        let value = server
            .run_blocking(None, |engine| engine.get_process_attribute(IMAGE, "explorer.exe", "pid"))
            .await
            .unwrap();
        assert_eq!(value, AttrValue::Int(4280));
    }

    #[tokio::test]
    async fn test_timeout_kind() {
        let backend = CountingBackend::new(&[IMAGE]).with_delay(Duration::from_millis(300));
        let server = server(backend, ServerConfig::default());
        let err = server
            .run_blocking(Some(Duration::from_millis(20)), |engine| engine.list_reghives(IMAGE))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::query::error::ErrorKind::Timeout);

        let (body, is_error) = envelope::<AttrValue>(Err(err));
        assert!(is_error);
        assert_eq!(body["kind"], "Timeout");
    }

    #[tokio::test]
    async fn test_hive_tool_accepts_integer_identifier() {
        let server = server(CountingBackend::new(&[IMAGE]), ServerConfig::default());
        let req: RegHiveAttributeRequest = serde_json::from_value(json!({
            "mempath": IMAGE,
            "hive_identifier": 0,
            "attributes": "reghive.path"
        }))
        .unwrap();
        let result = server.get_reghive_attribute(Parameters(req)).await.unwrap();
        assert_ne!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_missing_image_is_error_result() {
        let server = server(CountingBackend::new(&[IMAGE]), ServerConfig::default());
        let req: RegHiveListRequest =
            serde_json::from_value(json!({ "mempath": "/evidence/missing.raw" })).unwrap();
        let result = server.get_reghive_list(Parameters(req)).await.unwrap();
        assert_eq!(result.is_error, Some(true));
    }
}
