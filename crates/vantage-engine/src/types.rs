//! resource trait and the request/option types the engine passes around.

use crate::error::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use vantage_core::{FieldDiff, JsonMap, Operation, ValidationError};

/// http verbs used by the api.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// a single api call. `url` is relative to the base path until the client
/// resolves it.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonMap>,
}

impl Request {
    fn new(method: Method, url: impl Into<String>, body: Option<JsonMap>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url, None)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url, None)
    }

    pub fn post(url: impl Into<String>, body: JsonMap) -> Self {
        Self::new(Method::Post, url, Some(body))
    }

    pub fn put(url: impl Into<String>, body: JsonMap) -> Self {
        Self::new(Method::Put, url, Some(body))
    }

    pub fn patch(url: impl Into<String>, body: JsonMap) -> Self {
        Self::new(Method::Patch, url, Some(body))
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// prefix the url with `base` unless it is already absolute.
    pub fn resolve(mut self, base: &str) -> Self {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            self.url = format!(
                "{}/{}",
                base.trim_end_matches('/'),
                self.url.trim_start_matches('/')
            );
        }
        self
    }
}

/// directives restricting what apply may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lifecycle {
    /// fail instead of creating a missing resource.
    BlockCreation,
    /// fail if the resource already exists.
    BlockAcquire,
    /// fail instead of updating an existing resource.
    BlockModification,
}

/// per-call apply options.
#[derive(Debug, Clone)]
pub struct ApplyOptions<R> {
    pub lifecycle: BTreeSet<Lifecycle>,
    /// previously known state; its identity is used to fetch the initial state.
    pub state_hint: Option<R>,
}

impl<R> Default for ApplyOptions<R> {
    fn default() -> Self {
        Self {
            lifecycle: BTreeSet::new(),
            state_hint: None,
        }
    }
}

impl<R> ApplyOptions<R> {
    pub fn with_lifecycle(mut self, directive: Lifecycle) -> Self {
        self.lifecycle.insert(directive);
        self
    }

    pub fn with_state_hint(mut self, hint: R) -> Self {
        self.state_hint = Some(hint);
        self
    }

    pub fn blocks(&self, directive: Lifecycle) -> bool {
        self.lifecycle.contains(&directive)
    }
}

/// a managed resource kind.
///
/// implementations supply identity, request shapes, canonicalization and diff
/// policy; the client drives the reconciliation around them.
pub trait Resource:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Op: Operation;

    const KIND: &'static str;
    /// default api base path.
    const BASE_PATH: &'static str;
    /// json key holding the items of a list response.
    const LIST_ITEMS_KEY: &'static str;
    /// json keys stripped from request bodies.
    const UNSENT_FIELDS: &'static [&'static str] = &[];
    const SUPPORTS_CREATE: bool = true;
    const SUPPORTS_DELETE: bool = true;
    /// false when create answers with a long-running operation instead of the resource.
    const CREATE_RETURNS_RESOURCE: bool = true;
    /// page size at which the `pageSize` parameter is omitted.
    const MAX_PAGE_SIZE: u32 = 1000;

    /// required fields and oneof exclusivity, checked before any call.
    fn validate(&self) -> Result<(), ValidationError>;

    /// fully-qualified identity path.
    fn id(&self) -> Result<String, ValidationError>;

    /// false while a server-generated name is still unknown.
    fn has_identity(&self) -> bool {
        true
    }

    fn get_request(&self) -> Result<Request, Error>;

    /// list request for the parent described by `self`; paging is added by the client.
    fn list_request(&self) -> Result<Request, Error>;

    fn create_request(&self) -> Result<Request, Error>;

    fn delete_request(&self) -> Result<Request, Error>;

    fn update_request(
        &self,
        op: &Self::Op,
        diffs: &[FieldDiff<Self::Op>],
    ) -> Result<Request, Error>;

    /// api-shaped json body for this resource.
    fn expand(&self) -> Result<JsonMap, Error> {
        let value = serde_json::to_value(self).map_err(|source| Error::Marshal {
            kind: Self::KIND,
            source,
        })?;
        let Value::Object(mut map) = value else {
            return Err(Error::Unmarshal {
                kind: Self::KIND,
                message: "resource did not serialize to an object".to_string(),
            });
        };
        for key in Self::UNSENT_FIELDS {
            map.remove(*key);
        }
        map.retain(|_, v| !v.is_null());
        Ok(map)
    }

    /// oneof exclusivity on a raw api payload.
    fn check_payload(value: &Value) -> Result<(), ValidationError> {
        let _ = value;
        Ok(())
    }

    /// parse a json document, rejecting payloads with two oneof members set.
    fn from_json(value: Value) -> Result<Self, Error> {
        Self::check_payload(&value)?;
        serde_json::from_value(value).map_err(|err| Error::Unmarshal {
            kind: Self::KIND,
            message: err.to_string(),
        })
    }

    /// parse an api payload; identity parameters the api does not echo come from `hint`.
    fn flatten(value: Value, hint: &Self) -> Result<Self, Error> {
        let mut resource = Self::from_json(value)?;
        resource.adopt_identity(hint);
        Ok(resource)
    }

    /// parse a get response; `None` means the resource is absent.
    fn extract_get(value: Value, hint: &Self) -> Result<Option<Self>, Error> {
        Self::flatten(value, hint).map(Some)
    }

    /// parse a list page into items and the next page token.
    fn extract_list(value: Value, hint: &Self) -> Result<(Vec<Self>, Option<String>), Error> {
        let Value::Object(mut map) = value else {
            return Err(Error::Unmarshal {
                kind: Self::KIND,
                message: "list response is not an object".to_string(),
            });
        };
        let token = match map.remove("nextPageToken") {
            Some(Value::String(token)) if !token.is_empty() => Some(token),
            _ => None,
        };
        let items = match map.remove(Self::LIST_ITEMS_KEY) {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| Self::flatten(item, hint))
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };
        Ok((items, token))
    }

    /// copy identity parameters from `hint`, shortening echoed names otherwise.
    fn adopt_identity(&mut self, hint: &Self);

    /// take a server-generated identity from a create response.
    fn absorb_created(&mut self, created: &Self) {
        let _ = created;
    }

    fn canonicalize_desired(raw: &Self, initial: Option<&Self>) -> Self;

    fn canonicalize_new(raw_new: Self, raw_desired: &Self) -> Self;

    fn diff(desired: &Self, actual: &Self) -> Vec<FieldDiff<Self::Op>>;
}
