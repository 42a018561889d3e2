use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;

use docchat_logging::{chat_debug, chat_warn};

use crate::decode::StreamDecoder;
use crate::error::map_reqwest_error;
use crate::types::AskResponse;
use crate::upload::{progress_body, read_source};
use crate::{
    error_detail, ApiError, AskOutcome, EngineEvent, FailureKind, FileInfo, NewsArticle, OpId,
    ScrapeResponse, StatusMessage, UploadFile, UploadResponse,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// How `/delete` is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStyle {
    /// `DELETE /delete/{name}`
    #[default]
    PathParam,
    /// `POST /delete` with form field `file_name`.
    FormField,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Applies to uploads and scrapes, which can legitimately run long.
    pub operation_timeout: Duration,
    pub delete_style: DeleteStyle,
    pub scrape_tick: Duration,
    pub upload_chunk_size: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            operation_timeout: Duration::from_secs(300),
            delete_style: DeleteStyle::default(),
            scrape_tick: Duration::from_millis(500),
            upload_chunk_size: 64 * 1024,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// The document assistant's HTTP surface.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends a question. Streamed replies go out through `sink` as
    /// `AnswerChunk` events before this returns.
    async fn ask(
        &self,
        op: OpId,
        question: &str,
        sink: &dyn ProgressSink,
    ) -> Result<AskOutcome, ApiError>;

    /// Uploads one file, emitting `UploadProgress` as the body is sent.
    async fn upload(
        &self,
        op: OpId,
        file: &UploadFile,
        sink: &dyn ProgressSink,
    ) -> Result<UploadResponse, ApiError>;

    async fn list_files(&self) -> Result<Vec<FileInfo>, ApiError>;

    async fn delete_file(&self, name: &str) -> Result<StatusMessage, ApiError>;

    async fn clear_history(&self) -> Result<StatusMessage, ApiError>;

    async fn news(&self, query: &str) -> Result<Vec<NewsArticle>, ApiError>;

    async fn scrape(&self, url: &str) -> Result<ScrapeResponse, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
    base_url: Url,
    settings: ApiSettings,
}

impl ReqwestBackend {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(settings.base_url.trim()).map_err(|err| {
            ApiError::new(
                FailureKind::InvalidUrl,
                format!("Invalid API base URL {}: {err}", settings.base_url),
            )
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("Invalid API base URL {}", settings.base_url),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Unexpected, err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            settings,
        })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::new(
                    FailureKind::InvalidUrl,
                    format!("Invalid API base URL {}", self.base_url),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn post_form(&self, url: Url, pairs: &[(&str, &str)]) -> reqwest::RequestBuilder {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs.iter())
            .finish();
        self.client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
    }

    async fn stream_answer(
        &self,
        op: OpId,
        response: Response,
        sink: &dyn ProgressSink,
    ) -> Result<AskOutcome, ApiError> {
        let mut decoder = StreamDecoder::for_content_type(content_type(&response).as_deref());
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| map_reqwest_error(err, "Failed to send message"))?;
            let text = decoder.decode(&chunk);
            if !text.is_empty() {
                sink.emit(EngineEvent::AnswerChunk { op, text });
            }
        }
        let tail = decoder.finish();
        if !tail.is_empty() {
            sink.emit(EngineEvent::AnswerChunk { op, text: tail });
        }
        Ok(AskOutcome::Streamed)
    }
}

#[async_trait::async_trait]
impl ChatBackend for ReqwestBackend {
    async fn ask(
        &self,
        op: OpId,
        question: &str,
        sink: &dyn ProgressSink,
    ) -> Result<AskOutcome, ApiError> {
        const DEFAULT: &str = "Failed to send message";
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::new(
                FailureKind::Validation,
                "Message cannot be empty",
            ));
        }

        let url = self.endpoint(&["ask"])?;
        chat_debug!("ask op={op} url={url}");
        // Deadline covers the response head only; a streamed body may run long.
        let send = self.post_form(url, &[("question", question)]).send();
        let response = tokio::time::timeout(self.settings.request_timeout, send)
            .await
            .map_err(|_| ApiError::new(FailureKind::Timeout, "Request timed out"))?
            .map_err(|err| map_reqwest_error(err, DEFAULT))?;

        if !response.status().is_success() {
            return Err(status_error(response, DEFAULT).await);
        }

        let is_json = content_type(&response)
            .map(|ct| is_json_content_type(&ct))
            .unwrap_or(false);
        if !is_json {
            return self.stream_answer(op, response, sink).await;
        }

        let body: AskResponse = parse_body(response, DEFAULT).await?;
        let answer = [body.answer, body.message]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
            .unwrap_or_else(|| "No answer received".to_string());
        Ok(AskOutcome::Answer {
            answer,
            conversation_id: body.conversation_id.filter(|id| !id.is_empty()),
        })
    }

    async fn upload(
        &self,
        op: OpId,
        file: &UploadFile,
        sink: &dyn ProgressSink,
    ) -> Result<UploadResponse, ApiError> {
        const DEFAULT: &str = "Failed to upload file";
        let started = Instant::now();
        let data = read_source(file).await?;
        let total = data.len() as u64;
        let url = self.endpoint(&["upload"])?;
        chat_debug!("upload op={op} file={} bytes={total}", file.name);

        let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel();
        let body = progress_body(data, self.settings.upload_chunk_size, progress_tx);
        let part = reqwest::multipart::Part::stream_with_length(body, total)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|err| ApiError::new(FailureKind::Validation, err.to_string()))?;
        let form = reqwest::multipart::Form::new().part("files", part);

        let emit = |sent: u64| {
            sink.emit(EngineEvent::UploadProgress {
                op,
                sent,
                total,
                elapsed: started.elapsed(),
            });
        };

        let request = self
            .client
            .post(url)
            .multipart(form)
            .timeout(self.settings.operation_timeout)
            .send();
        tokio::pin!(request);
        let sent = loop {
            tokio::select! {
                biased;
                Some(sent) = progress_rx.recv() => emit(sent),
                result = &mut request => break result,
            }
        };
        while let Ok(sent) = progress_rx.try_recv() {
            emit(sent);
        }

        let response = sent.map_err(|err| map_reqwest_error(err, DEFAULT))?;
        if !response.status().is_success() {
            return Err(status_error(response, DEFAULT).await);
        }
        parse_body(response, "Failed to parse upload response").await
    }

    async fn list_files(&self) -> Result<Vec<FileInfo>, ApiError> {
        const DEFAULT: &str = "Failed to fetch files";
        let url = self.endpoint(&["files"])?;
        let response = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, DEFAULT))?;
        read_json(response, DEFAULT).await
    }

    async fn delete_file(&self, name: &str) -> Result<StatusMessage, ApiError> {
        const DEFAULT: &str = "Failed to delete file";
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::new(
                FailureKind::Validation,
                "File name cannot be empty",
            ));
        }
        let request = match self.settings.delete_style {
            DeleteStyle::PathParam => self.client.delete(self.endpoint(&["delete", name])?),
            DeleteStyle::FormField => {
                self.post_form(self.endpoint(&["delete"])?, &[("file_name", name)])
            }
        };
        chat_debug!("delete file={name} style={:?}", self.settings.delete_style);
        let response = request
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, DEFAULT))?;
        read_json_or_default(response, DEFAULT).await
    }

    async fn clear_history(&self) -> Result<StatusMessage, ApiError> {
        const DEFAULT: &str = "Failed to clear history";
        let url = self.endpoint(&["clear"])?;
        let response = self
            .client
            .delete(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, DEFAULT))?;
        read_json_or_default(response, DEFAULT).await
    }

    async fn news(&self, query: &str) -> Result<Vec<NewsArticle>, ApiError> {
        const DEFAULT: &str = "Failed to fetch news";
        let mut url = self.endpoint(&["news"])?;
        url.query_pairs_mut().append_pair("query", query);
        let response = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, DEFAULT))?;
        read_json(response, DEFAULT).await
    }

    async fn scrape(&self, url: &str) -> Result<ScrapeResponse, ApiError> {
        const DEFAULT: &str = "Failed to scrape URL";
        let endpoint = self.endpoint(&["scrape"])?;
        chat_debug!("scrape target={url}");
        let response = self
            .post_form(endpoint, &[("url", url)])
            .timeout(self.settings.operation_timeout)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, DEFAULT))?;
        read_json(response, DEFAULT).await
    }
}

fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or(content_type).trim();
    essence.eq_ignore_ascii_case("application/json")
        || essence.to_ascii_lowercase().ends_with("+json")
}

async fn read_json<T: DeserializeOwned>(response: Response, default: &str) -> Result<T, ApiError> {
    if !response.status().is_success() {
        return Err(status_error(response, default).await);
    }
    parse_body(response, default).await
}

/// Like [`read_json`], but an empty 2xx body decodes as `T::default()`.
async fn read_json_or_default<T: DeserializeOwned + Default>(
    response: Response,
    default: &str,
) -> Result<T, ApiError> {
    if !response.status().is_success() {
        return Err(status_error(response, default).await);
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|err| map_reqwest_error(err, default))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    decode_json(&bytes)
}

async fn parse_body<T: DeserializeOwned>(response: Response, default: &str) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|err| map_reqwest_error(err, default))?;
    decode_json(&bytes)
}

fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|err| {
        ApiError::new(
            FailureKind::Parse,
            format!("Invalid response from server: {err}"),
        )
    })
}

async fn status_error(response: Response, default: &str) -> ApiError {
    let status = response.status();
    let message = match response.bytes().await {
        Ok(bytes) => serde_json::from_slice::<Value>(&bytes)
            .map(|body| error_detail(&body, default))
            .unwrap_or_else(|_| default.to_string()),
        Err(err) => {
            chat_warn!("could not read error body for {status}: {err}");
            default.to_string()
        }
    };
    ApiError::new(FailureKind::HttpStatus(status.as_u16()), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> ReqwestBackend {
        ReqwestBackend::new(ApiSettings {
            base_url: base.to_string(),
            ..ApiSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_segments_and_encodes_names() {
        let backend = backend("http://localhost:8000/");
        assert_eq!(
            backend.endpoint(&["delete", "Q3 report#1.pdf"]).unwrap().as_str(),
            "http://localhost:8000/delete/Q3%20report%231.pdf"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let backend = backend("http://example.test/api");
        assert_eq!(
            backend.endpoint(&["ask"]).unwrap().as_str(),
            "http://example.test/api/ask"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ReqwestBackend::new(ApiSettings {
            base_url: "not a url".to_string(),
            ..ApiSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }

    #[test]
    fn json_content_type_detection() {
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type("text/event-stream"));
    }
}
