use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, Request, Url};

use crate::error::HttpError;

/// Pre-built request shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: Method,
    url: Url,
    headers: HeaderMap,
}

impl RequestTemplate {
    /// Builds the template from a method token, an absolute URL and a
    /// `User-Agent` value.
    ///
    /// # Errors
    ///
    /// Returns an error when the method is not a valid HTTP token, the URL
    /// cannot be parsed, or the user agent is not a valid header value.
    pub fn new(method: &str, url: &str, user_agent: &str) -> Result<Self, HttpError> {
        let method =
            Method::from_bytes(method.as_bytes()).map_err(|err| HttpError::InvalidMethod {
                method: method.to_owned(),
                source: err,
            })?;
        let url = Url::parse(url).map_err(|err| HttpError::InvalidUrl {
            url: url.to_owned(),
            source: err,
        })?;
        let user_agent =
            HeaderValue::from_str(user_agent).map_err(|err| HttpError::InvalidUserAgent {
                value: user_agent.to_owned(),
                source: err,
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, user_agent);

        Ok(Self {
            method,
            url,
            headers,
        })
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
    }

    /// Fresh request for one attempt. Templates carry no body, so this never fails.
    #[must_use]
    pub fn to_request(&self) -> Request {
        let mut request = Request::new(self.method.clone(), self.url.clone());
        *request.headers_mut() = self.headers.clone();
        request
    }
}
