//! REST [`RecordStore`] implementation speaking an OData-style protocol.

mod impls;
mod wire;

use std::{fmt, time::Duration};

use derive_more::{Display, Error as StdError, From};
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    RequestBuilder, Response,
};
use secrecy::{ExposeSecret as _, SecretString};
use serde::de::DeserializeOwned;
use smart_default::SmartDefault;
use tracerr::Traced;
use tracing as log;

use crate::infra::record_store;
#[cfg(doc)]
use crate::infra::RecordStore;

/// [`Rest`] client configuration.
#[derive(Debug, SmartDefault)]
pub struct Config {
    /// Base URL of the record store service root.
    #[default("http://127.0.0.1:8080/odata".into())]
    pub url: String,

    /// Bearer token to authenticate requests with, if any.
    pub token: Option<SecretString>,

    /// Timeout of a single request.
    #[default(Duration::from_secs(30))]
    pub timeout: Duration,
}

/// REST [`RecordStore`] client.
#[derive(Clone, Debug)]
pub struct Rest {
    /// HTTP client with the authentication headers preset.
    client: reqwest::Client,

    /// Base URL without a trailing slash.
    base_url: String,
}

impl Rest {
    /// Creates a new [`Rest`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the configured token is not a valid header value, or the HTTP
    /// client cannot be built.
    pub fn new(conf: &Config) -> Result<Self, Traced<record_store::Error>> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &conf.token {
            let mut value =
                HeaderValue::try_from(format!("Bearer {}", token.expose_secret()))
                    .map_err(tracerr::from_and_wrap!(=> Error))
                    .map_err(tracerr::map_from)?;
            value.set_sensitive(true);
            _ = headers.insert(header::AUTHORIZATION, value);
        }
        _ = headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(conf.timeout)
            .build()
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;

        Ok(Self {
            client,
            base_url: conf.url.trim_end_matches('/').to_owned(),
        })
    }

    /// Returns the absolute URL of the provided resource `path`.
    fn url(&self, path: impl fmt::Display) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Sends the provided `request`, ensuring it succeeded.
    async fn send(
        request: RequestBuilder,
    ) -> Result<Response, Traced<record_store::Error>> {
        let response = request
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;

        let status = response.status();
        log::debug!("{} {status}", response.url());
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_owned());
        Err(tracerr::new!(record_store::Error::Rejected {
            status: status.as_u16(),
            body,
        }))
    }

    /// Sends the provided `request` and decodes its JSON response body.
    async fn fetch<T: DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<T, Traced<record_store::Error>> {
        let body = Self::send(request)
            .await
            .map_err(tracerr::wrap!())?
            .bytes()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        serde_json::from_slice(&body)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

/// [`Rest`] client [`Error`].
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Request failed to be sent or its response failed to be received.
    #[display("transport failure: {_0}")]
    Transport(reqwest::Error),

    /// Response body is not the expected JSON.
    #[display("cannot decode response body: {_0}")]
    Decode(serde_json::Error),

    /// Configured token cannot be sent in a header.
    #[display("invalid bearer token: {_0}")]
    InvalidToken(header::InvalidHeaderValue),
}

impl Error {
    /// Indicates whether the failed request may succeed if simply retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => !(e.is_builder() || e.is_decode()),
            Self::Decode(_) | Self::InvalidToken(_) => false,
        }
    }
}
