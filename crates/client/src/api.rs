use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::notify::Notifier;
use crate::schema::{
    ConflictGraph, ExportFormat, GenerationResponse, GraphPayload, GroupList, GroupSchedule,
    SystemStatus, TeacherList, TeacherSchedule, UploadResponse, ValidationReport,
};
use crate::upload::UploadFile;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin of the scheduling backend, e.g. `http://localhost:5000`.
    pub base_url: String,
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// Request body for [`ApiClient::post`].
#[derive(Debug, Clone)]
pub enum PostBody {
    Empty,
    Json(Value),
    File(UploadFile),
}

/// A downloaded export.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Client for the scheduling backend.
///
/// Every failing call pushes exactly one error notification and then returns
/// the error, so callers only decide whether to skip dependent rendering.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    notifier: Arc<Notifier>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, notifier: Arc<Notifier>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            notifier,
        }
    }

    pub fn from_config(config: &ClientConfig, notifier: Arc<Notifier>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|source| ApiError::Network {
                path: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
            notifier,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    /// GET `path` and decode the JSON body into `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.get(self.url(path));
        let result = match self.send_json(path, request).await {
            Ok(value) => decode(path, value),
            Err(e) => Err(e),
        };
        result.map_err(|e| self.report(path, e))
    }

    /// POST `body` to `path` and decode the JSON body into `T`.
    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: PostBody) -> Result<T> {
        let result = match self.build_post(path, body) {
            Ok(request) => match self.send_json(path, request).await {
                Ok(value) => decode(path, value),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        result.map_err(|e| self.report(path, e))
    }

    // ========== Typed endpoints ==========

    pub async fn estado(&self) -> Result<SystemStatus> {
        self.get("/api/estado").await
    }

    pub async fn grupos(&self) -> Result<Vec<String>> {
        let list: GroupList = self.get("/api/grupos").await?;
        Ok(list.grupos)
    }

    pub async fn horario_grupo(&self, grupo: &str) -> Result<GroupSchedule> {
        self.get(&encoded_path(&["api", "horario", grupo])).await
    }

    pub async fn profesores(&self) -> Result<TeacherList> {
        self.get("/api/profesores").await
    }

    pub async fn profesor(&self, nombre: &str) -> Result<TeacherSchedule> {
        self.get(&encoded_path(&["api", "profesor", nombre])).await
    }

    /// Fetch the conflict graph and check node id uniqueness.
    pub async fn grafo(&self) -> Result<ConflictGraph> {
        const PATH: &str = "/api/grafo";
        let payload: GraphPayload = self.get(PATH).await?;
        payload
            .into_graph()
            .map_err(|reason| self.report(PATH, ApiError::malformed(PATH, reason)))
    }

    pub async fn validacion(&self) -> Result<ValidationReport> {
        self.get("/api/validacion").await
    }

    pub async fn upload(&self, file: UploadFile) -> Result<UploadResponse> {
        tracing::info!(file = %file.file_name, size = file.size(), "uploading source file");
        self.post("/api/upload", PostBody::File(file)).await
    }

    /// Validate an in-memory file and upload it. A rejected file never
    /// reaches the network.
    pub async fn upload_bytes(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse> {
        match UploadFile::new(file_name, bytes) {
            Ok(file) => self.upload(file).await,
            Err(rejection) => Err(self.report("/api/upload", rejection.into())),
        }
    }

    pub async fn upload_path(&self, path: &Path) -> Result<UploadResponse> {
        match UploadFile::from_path(path).await {
            Ok(file) => self.upload(file).await,
            Err(e) => Err(self.report("/api/upload", e)),
        }
    }

    pub async fn generar_horarios(&self) -> Result<GenerationResponse> {
        self.post("/api/generar-horarios", PostBody::Empty).await
    }

    /// Download an export rendered by the backend.
    pub async fn exportar(&self, formato: ExportFormat) -> Result<ExportFile> {
        let label = formato.as_str().to_uppercase();
        self.notifier.info(format!("Generando archivo {}...", label));

        let path = encoded_path(&["api", "exportar", formato.as_str()]);
        let request = self.client.get(self.url(&path));
        let bytes = match self.send(&path, request).await {
            Ok(response) => response
                .bytes()
                .await
                .map_err(|source| ApiError::Network {
                    path: path.clone(),
                    source,
                }),
            Err(e) => Err(e),
        }
        .map_err(|e| self.report(&path, e))?;

        let file_name = format!(
            "horarios_{}.{}",
            chrono::Utc::now().timestamp_millis(),
            formato.extension()
        );
        self.notifier
            .success(format!("Archivo {} descargado exitosamente", label));
        tracing::info!(%file_name, bytes = bytes.len(), "export downloaded");

        Ok(ExportFile {
            file_name,
            mime_type: formato.mime_type(),
            bytes: bytes.to_vec(),
        })
    }

    // ========== Plumbing ==========

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn build_post(&self, path: &str, body: PostBody) -> Result<RequestBuilder> {
        let request = self.client.post(self.url(path));
        let request = match body {
            PostBody::Empty => request,
            PostBody::Json(value) => request.json(&value),
            PostBody::File(file) => {
                let part = reqwest::multipart::Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(file.kind.mime_type())
                    .map_err(|source| ApiError::Network {
                        path: path.to_string(),
                        source,
                    })?;
                request.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };
        Ok(request)
    }

    /// Send and turn non-success statuses into [`ApiError::Status`].
    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|source| ApiError::Network {
            path: path.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(path, status = status.as_u16(), "backend response");
            return Ok(response);
        }

        let server_message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| error_field(&body));
        let message = server_message.unwrap_or_else(|| match status.canonical_reason() {
            Some(reason) => format!("Error {}: {}", status.as_u16(), reason),
            None => format!("Error {}", status.as_u16()),
        });

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json(&self, path: &str, request: RequestBuilder) -> Result<Value> {
        let response = self.send(path, request).await?;
        let text = response.text().await.map_err(|source| ApiError::Network {
            path: path.to_string(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| ApiError::malformed(path, format!("JSON inválido: {}", e)))?;

        if let Some(message) = error_field(&value) {
            return Err(ApiError::Server(message));
        }
        Ok(value)
    }

    fn report(&self, path: &str, error: ApiError) -> ApiError {
        tracing::error!(path, error = %error, "backend call failed");
        let message = match &error {
            ApiError::UploadRejected(rejection) => rejection.to_string(),
            other => format!("Error: {}", other),
        };
        self.notifier.error(message);
        error
    }
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ApiError::malformed(path, e.to_string()))
}

fn error_field(body: &Value) -> Option<String> {
    body.get("error").and_then(Value::as_str).map(str::to_string)
}

/// Percent-encoded absolute path built from raw segments.
fn encoded_path(segments: &[&str]) -> String {
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return format!("/{}", segments.join("/"));
    };
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
    url.path().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_path() {
        assert_eq!(encoded_path(&["api", "horario", "ITI-1V"]), "/api/horario/ITI-1V");
        assert_eq!(
            encoded_path(&["api", "profesor", "Dr. Juan Pérez"]),
            "/api/profesor/Dr.%20Juan%20P%C3%A9rez"
        );
        assert_eq!(encoded_path(&["api", "horario", "a/b"]), "/api/horario/a%2Fb");
    }

    #[test]
    fn test_url_joins_base() {
        let notifier = Notifier::new(&Default::default());
        let client = ApiClient::new("http://localhost:5000/", notifier);
        assert_eq!(client.url("/api/estado"), "http://localhost:5000/api/estado");
    }
}
