use reqwest::header::{HOST, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Request};

use crate::config::LoadSessionConfig;
use crate::error::ValidationError;

/// Method, headers, and body shared by every request of a session.
#[derive(Debug, Clone)]
pub(crate) struct RequestTemplate {
    method: Method,
    headers: HeaderMap,
    body: Option<String>,
}

impl RequestTemplate {
    pub(crate) fn from_config(config: &LoadSessionConfig) -> Result<Self, ValidationError> {
        let mut headers = HeaderMap::with_capacity(config.headers.len().saturating_add(1));
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
                ValidationError::InvalidHeaderName {
                    name: key.clone(),
                    source: err,
                }
            })?;
            let value = header_value(key, value)?;
            headers.insert(name, value);
        }
        if let Some(host) = config.host_header.as_deref()
            && !headers.contains_key(HOST)
        {
            headers.insert(HOST, header_value("host", host)?);
        }

        Ok(Self {
            method: config.method.clone(),
            headers,
            body: (!config.body.is_empty()).then(|| config.body.clone()),
        })
    }

    pub(crate) fn build(&self, client: &Client, url: &str) -> Result<Request, reqwest::Error> {
        let mut builder = client
            .request(self.method.clone(), url)
            .headers(self.headers.clone());
        if let Some(body) = self.body.as_ref() {
            builder = builder.body(body.clone());
        }
        builder.build()
    }

    #[cfg(test)]
    pub(crate) const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ValidationError> {
    HeaderValue::from_str(value).map_err(|err| ValidationError::InvalidHeaderValue {
        name: name.to_owned(),
        source: err,
    })
}
