use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{
    BackendError, BackendResult, ImageSearchService, PublishingBackend, ResizeService,
    TemplateStore, TranslationService, TranslationToggle,
};
use crate::config::{AppConfig, ConfigError};
use crate::resize::{ResizeReply, ResizeRequest};
use crate::search::{SearchQuery, SearchReply};
use crate::submission::{PublishReply, SubmissionPayload};
use crate::template::Template;
use crate::translation::TranslationReply;

const TRANSLATE_PATH: &str = "/translate_keywords";
const SEARCH_PATH: &str = "/fetch_images";
const RESIZE_PATH: &str = "/resize_image";
const SAVE_TEMPLATE_PATH: &str = "/save_template";
const TRANSLATION_STATUS_PATH: &str = "/translation_status";
const TOGGLE_TRANSLATION_PATH: &str = "/toggle_translation";

#[derive(Debug, Serialize)]
struct ToggleRequest {
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct ToggleReply {
    translation_enabled: bool,
}

/// Error bodies may carry either field.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    publish_path: String,
}

impl HttpBackend {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl {
                url: config.base_url.clone(),
            });
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| ConfigError::HttpClient {
                message: err.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            publish_path: config.publish_path.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }

    fn send(&self, endpoint: &'static str, request: RequestBuilder) -> BackendResult<Response> {
        let response = request.send().map_err(|err| {
            tracing::warn!(endpoint, %err, "request failed before a response arrived");
            BackendError::Transport {
                endpoint,
                message: err.to_string(),
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| status.to_string());
        tracing::warn!(endpoint, %status, %message, "service returned an error status");
        Err(BackendError::Service { endpoint, message })
    }

    fn decode<T: DeserializeOwned>(endpoint: &'static str, response: Response) -> BackendResult<T> {
        response.json::<T>().map_err(|err| BackendError::Decode {
            endpoint,
            message: err.to_string(),
        })
    }
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    }
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.message.or(parsed.error)
}

impl TranslationService for HttpBackend {
    fn translate(&self, keywords: &str) -> BackendResult<TranslationReply> {
        const ENDPOINT: &str = "translate_keywords";
        let request = self
            .client
            .get(self.url(TRANSLATE_PATH))
            .query(&[("keywords", keywords)]);
        let response = self.send(ENDPOINT, request)?;
        Self::decode(ENDPOINT, response)
    }
}

impl ImageSearchService for HttpBackend {
    fn search(&self, query: &SearchQuery) -> BackendResult<SearchReply> {
        const ENDPOINT: &str = "fetch_images";
        let request = self.client.get(self.url(SEARCH_PATH)).query(&query.params());
        let response = self.send(ENDPOINT, request)?;
        Self::decode(ENDPOINT, response)
    }
}

impl ResizeService for HttpBackend {
    fn resize(&self, request: &ResizeRequest) -> BackendResult<ResizeReply> {
        const ENDPOINT: &str = "resize_image";
        let builder = self.client.post(self.url(RESIZE_PATH)).json(request);
        let response = self.send(ENDPOINT, builder)?;
        Self::decode(ENDPOINT, response)
    }
}

impl TemplateStore for HttpBackend {
    fn save_template(&self, template: &Template) -> BackendResult<()> {
        const ENDPOINT: &str = "save_template";
        let builder = self.client.post(self.url(SAVE_TEMPLATE_PATH)).json(template);
        self.send(ENDPOINT, builder).map(|_| ())
    }
}

impl PublishingBackend for HttpBackend {
    fn publish(&self, payload: &SubmissionPayload) -> BackendResult<PublishReply> {
        const ENDPOINT: &str = "publish";
        let form = payload
            .fields()
            .iter()
            .fold(multipart::Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            });
        let builder = self.client.post(self.url(&self.publish_path)).multipart(form);
        let response = self.send(ENDPOINT, builder)?;
        Self::decode(ENDPOINT, response)
    }
}

impl TranslationToggle for HttpBackend {
    fn translation_enabled(&self) -> BackendResult<bool> {
        const ENDPOINT: &str = "translation_status";
        let response = self.send(ENDPOINT, self.client.get(self.url(TRANSLATION_STATUS_PATH)))?;
        Self::decode::<ToggleReply>(ENDPOINT, response).map(|reply| reply.translation_enabled)
    }

    fn set_translation_enabled(&self, enabled: bool) -> BackendResult<bool> {
        const ENDPOINT: &str = "toggle_translation";
        let builder = self
            .client
            .post(self.url(TOGGLE_TRANSLATION_PATH))
            .json(&ToggleRequest { enabled });
        let response = self.send(ENDPOINT, builder)?;
        Self::decode::<ToggleReply>(ENDPOINT, response).map(|reply| reply.translation_enabled)
    }
}
