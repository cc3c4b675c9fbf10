use crate::Result;

use ::http::{
    header::{ACCEPT, CONTENT_TYPE},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error {
    #[cfg(target_family = "wasm")]
    #[from]
    error: reqwasm::Error,
    #[cfg(not(target_family = "wasm"))]
    error: std::convert::Infallible,
}

#[derive(Clone, Debug, Default)]
pub struct Client {
    #[cfg(target_family = "wasm")]
    inner: wasm::InnerClient,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(target_family = "wasm")]
    pub async fn send(&self, request: Request) -> Result<Response> {
        self.inner.send(request).await
    }

    /// There is no HTTP transport outside of the browser.
    #[cfg(not(target_family = "wasm"))]
    pub async fn send(&self, request: Request) -> Result<Response> {
        log::debug!("Dropping request to {}: unsupported target", request.uri);
        Err(crate::Error::Unsupported)
    }
}

#[derive(Clone, Debug)]
pub struct Request {
    uri: String,
    method: Method,
    headers: Vec<(&'static str, String)>,
    body: Option<String>,
}

impl Request {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the value of the first header named `key`.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

impl Default for Request {
    fn default() -> Self {
        Self {
            uri: String::new(),
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RequestBuilder {
    inner: Request,
}

impl RequestBuilder {
    pub fn new(uri: String) -> Self {
        Self {
            inner: Request {
                uri,
                ..Default::default()
            },
        }
    }

    /// Sets the request method to `GET`.
    pub fn get(mut self) -> Self {
        self.inner.method = Method::GET;
        self
    }

    /// Sets the request method to `POST`.
    pub fn post(mut self) -> Self {
        self.inner.method = Method::POST;
        self
    }

    /// Appends `uri` to the base uri of the request.
    pub fn uri(mut self, uri: &str) -> Self {
        self.inner.uri.push_str(uri);
        self
    }

    /// Adds an header to the request.
    pub fn header<T>(mut self, key: &'static str, value: T) -> Self
    where
        T: ToString,
    {
        self.inner.headers.push((key, value.to_string()));
        self
    }

    /// Requests a json response body.
    pub fn json(self) -> Self {
        self.header(ACCEPT.as_str(), "application/json")
    }

    /// Uses `T` serialized as json as the request body.
    pub fn body<T>(mut self, body: &T) -> Result<Self>
    where
        T: Serialize,
    {
        self.inner.body = Some(serde_json::to_string(body)?);
        Ok(self.header(CONTENT_TYPE.as_str(), "application/json"))
    }

    pub fn build(self) -> Request {
        self.inner
    }
}

#[derive(Debug)]
pub struct Response {
    #[cfg(target_family = "wasm")]
    inner: wasm::InnerResponse,
    #[cfg(not(target_family = "wasm"))]
    inner: std::convert::Infallible,
}

impl Response {
    /// Returns `true` if the response contains a 2xx status code.
    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }
}

#[cfg(target_family = "wasm")]
impl Response {
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub async fn json<T>(self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.inner.json().await
    }
}

#[cfg(not(target_family = "wasm"))]
impl Response {
    pub fn status(&self) -> StatusCode {
        match self.inner {}
    }

    pub async fn json<T>(self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        match self.inner {}
    }
}


#[cfg(target_family = "wasm")]
mod wasm {
    use super::{Error, Request, Response};
    use crate::Result;

    use ::http::{Method, StatusCode};
    use serde::de::DeserializeOwned;

    #[derive(Copy, Clone, Debug, Default)]
    pub struct InnerClient;

    impl InnerClient {
        pub async fn send(&self, request: Request) -> Result<Response> {
            log::debug!("{} {}", request.method, request.uri);

            let method = match request.method {
                Method::GET => reqwasm::http::Method::GET,
                Method::POST => reqwasm::http::Method::POST,
                _ => return Err(crate::Error::Unsupported),
            };

            let mut req = reqwasm::http::Request::new(&request.uri).method(method);

            for (key, value) in &request.headers {
                req = req.header(key, value);
            }

            if let Some(body) = request.body {
                req = req.body(body);
            }

            let resp = req.send().await.map_err(Error::from)?;

            Ok(Response {
                inner: InnerResponse(resp),
            })
        }
    }

    #[derive(Debug)]
    pub struct InnerResponse(reqwasm::http::Response);

    impl InnerResponse {
        pub fn status(&self) -> StatusCode {
            StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }

        pub async fn json<T>(self) -> Result<T>
        where
            T: DeserializeOwned,
        {
            Ok(self.0.json().await.map_err(Error::from)?)
        }
    }
}
