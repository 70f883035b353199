//! Declarative request descriptors.
//!
//! A [`RequestDescriptor`] is the complete description of one HTTP exchange
//! before it runs. [`Request`] wraps a descriptor with a shape marker
//! ([`One`] or [`Many`]) that fixes, at compile time, whether the call
//! decodes one value or walks every page of a list.

use std::fmt;
use std::marker::PhantomData;

use futures_util::future::{BoxFuture, FutureExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::dispatch::Dispatcher;
use crate::{Error, Result};

/// Content type of JSON request bodies.
pub const APPLICATION_JSON: &str = "application/json";

/// Content type of form-encoded request bodies.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Whether a call yields one value or the concatenation of every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// One decoded value, one exchange.
    Single,
    /// Items of every page, in order.
    List,
}

/// A request body together with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    /// Value sent as `Content-Type`
    pub content_type: String,
    /// Encoded payload
    pub content: String,
}

/// What URL an exchange goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// The descriptor's path template with path and query parameters applied.
    Template,
    /// A next-page reference, used exactly as given.
    Link(&'a str),
}

/// The complete, declarative description of one HTTP exchange.
#[derive(Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    path_params: Vec<(String, String)>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Body>,
    shape: ResultShape,
}

impl RequestDescriptor {
    /// Create a descriptor with no parameters, headers or body.
    pub fn new(method: Method, path: impl Into<String>, shape: ResultShape) -> Self {
        Self {
            method,
            path: path.into(),
            path_params: Vec::new(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            shape,
        }
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path template, `{name}` placeholders included.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path parameters in insertion order.
    pub fn path_params(&self) -> &[(String, String)] {
        &self.path_params
    }

    /// Query parameters in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Headers sent with the request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body, if any.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Declared result shape.
    pub fn shape(&self) -> ResultShape {
        self.shape
    }

    /// Set a path parameter, replacing an earlier value of the same name.
    pub fn set_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.path_params.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.path_params.push((name, value)),
        }
    }

    /// Append a query parameter. Repeated names are sent repeatedly.
    pub fn push_query(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query.push((name.into(), value.into()));
    }

    /// Set a header, overwriting any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Set the body and its content type.
    pub fn set_body(&mut self, content_type: impl Into<String>, content: impl Into<String>) {
        self.body = Some(Body {
            content_type: content_type.into(),
            content: content.into(),
        });
    }

    /// Set the `Authorization` header to `scheme credentials`.
    ///
    /// The value is marked sensitive so it never shows up in debug output.
    pub fn set_authorization(&mut self, scheme: &str, credentials: &str) -> Result<()> {
        let mut value = HeaderValue::from_str(&format!("{scheme} {credentials}"))
            .map_err(|_| Error::InvalidRequest("Invalid authorization header value".to_string()))?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Substitute every `{name}` placeholder in the path template.
    ///
    /// Values are percent-encoded. A placeholder without a matching
    /// parameter, an unterminated `{`, or a value of `.` or `..` is an error.
    pub fn resolve_path(&self) -> Result<String> {
        let mut resolved = String::with_capacity(self.path.len());
        let mut rest = self.path.as_str();

        while let Some(open) = rest.find('{') {
            resolved.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                Error::InvalidRequest(format!("Unterminated placeholder in path {}", self.path))
            })?;
            let name = &after[..close];
            let value = self
                .path_params
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
                .ok_or_else(|| {
                    Error::InvalidRequest(format!(
                        "Missing path parameter `{}` for {}",
                        name, self.path
                    ))
                })?;
            // URL parsing collapses dot segments, encoded or not.
            if value == "." || value == ".." {
                return Err(Error::InvalidRequest(format!(
                    "Path parameter `{}` may not be `{}` in {}",
                    name, value, self.path
                )));
            }
            resolved.push_str(&urlencoding::encode(value));
            rest = &after[close + 1..];
        }

        resolved.push_str(rest);
        Ok(resolved)
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("path_params", &self.path_params)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|b| &b.content_type))
            .field("shape", &self.shape)
            .finish()
    }
}

/// Declares what a [`Request`] decodes into and how it is dispatched.
///
/// Implemented by [`One`] and [`Many`]; not meant to be implemented
/// outside this crate.
pub trait Shape: Send + Sync + 'static {
    /// What a successful call returns.
    type Output: Send;

    /// Tag recorded on the descriptor.
    const SHAPE: ResultShape;

    #[doc(hidden)]
    fn dispatch<'a>(
        dispatcher: &'a Dispatcher,
        descriptor: &'a RequestDescriptor,
    ) -> BoxFuture<'a, Result<Self::Output>>;
}

/// Shape marker: the call decodes exactly one `T`.
pub struct One<T>(PhantomData<fn() -> T>);

/// Shape marker: the call walks every page and returns all `T`s.
pub struct Many<T>(PhantomData<fn() -> T>);

impl<T> Shape for One<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;
    const SHAPE: ResultShape = ResultShape::Single;

    fn dispatch<'a>(
        dispatcher: &'a Dispatcher,
        descriptor: &'a RequestDescriptor,
    ) -> BoxFuture<'a, Result<T>> {
        dispatcher.fetch_one::<T>(descriptor).boxed()
    }
}

impl<T> Shape for Many<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = Vec<T>;
    const SHAPE: ResultShape = ResultShape::List;

    fn dispatch<'a>(
        dispatcher: &'a Dispatcher,
        descriptor: &'a RequestDescriptor,
    ) -> BoxFuture<'a, Result<Vec<T>>> {
        dispatcher.fetch_all::<T>(descriptor).boxed()
    }
}

/// A typed request: a descriptor plus its declared result shape.
///
/// # Example
///
/// ```
/// use learnhub_rs::client::{Many, One, Request, ResultShape};
///
/// #[derive(serde::Deserialize)]
/// struct Course { id: String }
///
/// let one = Request::<One<Course>>::get("/v1/courses/{courseId}")
///     .path_param("courseId", "c-42");
/// assert_eq!(one.descriptor().resolve_path().unwrap(), "/v1/courses/c-42");
///
/// let all = Request::<Many<Course>>::get("/v1/courses").query("limit", 50);
/// assert_eq!(all.descriptor().shape(), ResultShape::List);
/// ```
pub struct Request<S: Shape> {
    descriptor: RequestDescriptor,
    _shape: PhantomData<fn() -> S>,
}

impl<S: Shape> Request<S> {
    /// Create a request for the given method and path template.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            descriptor: RequestDescriptor::new(method, path, S::SHAPE),
            _shape: PhantomData,
        }
    }

    /// GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// PATCH request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Set a `{name}` path parameter.
    pub fn path_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.descriptor.set_path_param(name, value.to_string());
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.descriptor.push_query(name, value.to_string());
        self
    }

    /// Set a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.descriptor.set_header(name, value);
        self
    }

    /// Set the `Authorization` header to `scheme credentials`.
    pub fn authorization(mut self, scheme: &str, credentials: &str) -> Result<Self> {
        self.descriptor.set_authorization(scheme, credentials)?;
        Ok(self)
    }

    /// Set a raw body with an explicit content type.
    pub fn body(mut self, content_type: impl Into<String>, content: impl Into<String>) -> Self {
        self.descriptor.set_body(content_type, content);
        self
    }

    /// Serialize `payload` as a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, payload: &B) -> Result<Self> {
        let content = serde_json::to_string(payload)
            .map_err(|e| Error::InvalidRequest(format!("Unserializable body: {e}")))?;
        self.descriptor.set_body(APPLICATION_JSON, content);
        Ok(self)
    }

    /// Encode `pairs` as an `application/x-www-form-urlencoded` body.
    pub fn form<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let content = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.descriptor.set_body(FORM_URLENCODED, content);
        self
    }

    /// The underlying descriptor.
    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Unwrap into the underlying descriptor.
    pub fn into_descriptor(self) -> RequestDescriptor {
        self.descriptor
    }
}

impl<S: Shape> Clone for Request<S> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            _shape: PhantomData,
        }
    }
}

impl<S: Shape> fmt::Debug for Request<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Request").field(&self.descriptor).finish()
    }
}
