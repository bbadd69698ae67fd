//! The remote resource API client.
//!
//! Callers address resources by path (`organizations`, `workspaces/ws-123`,
//! `runs/run-9/actions/apply`); the client supplies authentication,
//! content-type, pagination, and error mapping. [`Client`] additionally
//! wraps every verb in the bounded retry of [`crate::retry`].

use crate::document::{Collection, Single};
use crate::error::{Error, Result};
use crate::retry::{RetryPolicy, with_retry};
use serde_json::Value;
use ureq::Agent;
use ureq::tls::TlsConfig;

/// Fallback URL when neither flag, environment, nor profile supplies one.
pub const DEFAULT_URL: &str = "https://terraform.example.com";

/// Collections are fetched in pages of this size.
const PAGE_SIZE: u32 = 100;

/// Per-invocation connection settings.
///
/// Constructed fresh for every invocation; nothing here is shared or
/// cached across invocations.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Base URL of the service, without the `/api/v2` suffix.
    pub base_url: String,
    /// Bearer token used for every request.
    pub token: String,
    /// Whether to validate TLS certificates.
    pub verify_tls: bool,
    /// Whether to honor proxy settings from the environment.
    pub use_proxy: bool,
}

impl Connection {
    /// Create settings with TLS verification and proxy use enabled.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            verify_tls: true,
            use_proxy: true,
        }
    }

    /// Disable TLS certificate validation.
    #[must_use]
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.verify_tls = !insecure;
        self
    }

    /// Ignore proxy settings from the environment.
    #[must_use]
    pub fn without_proxy(mut self, no_proxy: bool) -> Self {
        self.use_proxy = !no_proxy;
        self
    }
}

/// The uniform verb contract every reconciliation module drives.
///
/// Implementations perform exactly one remote call per method invocation
/// (modulo pagination in `list`); retrying lives in [`Client`], not here.
pub trait Api {
    /// Fetch a collection, following pagination to exhaustion.
    fn list(&self, path: &str, query: &[(&str, String)]) -> Result<Collection>;

    /// Fetch a single resource, optionally side-loading related resources.
    fn show(&self, path: &str, include: Option<&str>) -> Result<Single>;

    /// Create a resource under the given path.
    fn create(&self, path: &str, payload: &Value) -> Result<Single>;

    /// Update an existing resource.
    fn update(&self, path: &str, payload: &Value) -> Result<Single>;

    /// Delete a resource. Returns the response body, usually empty.
    fn destroy(&self, path: &str) -> Result<Value>;

    /// Invoke a resource-specific action (lock, apply, cancel, ...).
    fn action(&self, path: &str, payload: Option<&Value>) -> Result<Value>;
}

/// Blocking HTTP implementation of [`Api`] over ureq.
pub struct HttpApi {
    agent: Agent,
    base_url: String,
    token: String,
}

impl HttpApi {
    /// Build an HTTP client from connection settings.
    pub fn new(connection: &Connection) -> Self {
        let mut config = Agent::config_builder().http_status_as_error(false);

        if !connection.verify_tls {
            config = config.tls_config(
                TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            );
        }
        if !connection.use_proxy {
            config = config.proxy(None);
        }

        Self {
            agent: config.build().new_agent(),
            base_url: connection.base_url.trim_end_matches('/').to_string(),
            token: connection.token.clone(),
        }
    }

    /// The resolved base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let auth = format!("Bearer {}", self.token);
        let mut request = self
            .agent
            .get(self.url(path))
            .header("Authorization", auth.as_str())
            .header("Content-Type", "application/vnd.api+json");
        for (key, value) in query {
            request = request.query(*key, value);
        }
        read_body(request.call()?)
    }

    fn send(&self, method: Method, path: &str, payload: Option<&Value>) -> Result<Value> {
        let url = self.url(path);
        let auth = format!("Bearer {}", self.token);

        let response = match (method, payload) {
            (Method::Post, Some(body)) => self
                .agent
                .post(&url)
                .header("Authorization", auth.as_str())
                .header("Content-Type", "application/vnd.api+json")
                .send_json(body)?,
            (Method::Post, None) => self
                .agent
                .post(&url)
                .header("Authorization", auth.as_str())
                .header("Content-Type", "application/vnd.api+json")
                .send_empty()?,
            (Method::Patch, Some(body)) => self
                .agent
                .patch(&url)
                .header("Authorization", auth.as_str())
                .header("Content-Type", "application/vnd.api+json")
                .send_json(body)?,
            (Method::Patch, None) => self
                .agent
                .patch(&url)
                .header("Authorization", auth.as_str())
                .header("Content-Type", "application/vnd.api+json")
                .send_empty()?,
            (Method::Delete, _) => self
                .agent
                .delete(&url)
                .header("Authorization", auth.as_str())
                .header("Content-Type", "application/vnd.api+json")
                .call()?,
        };

        read_body(response)
    }
}

#[derive(Clone, Copy)]
enum Method {
    Post,
    Patch,
    Delete,
}

/// Read a response body, mapping non-success statuses to [`Error::Api`].
fn read_body(mut response: ureq::http::Response<ureq::Body>) -> Result<Value> {
    let status = response.status();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(Error::from)?;

    if !status.is_success() {
        return Err(Error::from_response(status.as_u16(), &body));
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

impl Api for HttpApi {
    fn list(&self, path: &str, query: &[(&str, String)]) -> Result<Collection> {
        let mut combined = Collection::default();
        let mut page_number = 1u32;

        loop {
            let mut query = query.to_vec();
            query.push(("page[number]", page_number.to_string()));
            query.push(("page[size]", PAGE_SIZE.to_string()));

            let page: Collection = serde_json::from_value(self.get(path, &query)?)?;
            let next = page
                .meta
                .as_ref()
                .and_then(|m| m.pagination.as_ref())
                .and_then(|p| p.next_page);
            combined.extend(page);

            match next {
                Some(n) => page_number = n,
                None => break,
            }
        }

        Ok(combined)
    }

    fn show(&self, path: &str, include: Option<&str>) -> Result<Single> {
        let query: Vec<(&str, String)> = include
            .map(|i| vec![("include", i.to_string())])
            .unwrap_or_default();
        Ok(serde_json::from_value(self.get(path, &query)?)?)
    }

    fn create(&self, path: &str, payload: &Value) -> Result<Single> {
        Ok(serde_json::from_value(
            self.send(Method::Post, path, Some(payload))?,
        )?)
    }

    fn update(&self, path: &str, payload: &Value) -> Result<Single> {
        Ok(serde_json::from_value(
            self.send(Method::Patch, path, Some(payload))?,
        )?)
    }

    fn destroy(&self, path: &str) -> Result<Value> {
        self.send(Method::Delete, path, None)
    }

    fn action(&self, path: &str, payload: Option<&Value>) -> Result<Value> {
        self.send(Method::Post, path, payload)
    }
}

/// An [`Api`] bundled with a [`RetryPolicy`]: every verb becomes a
/// retrying call with the invocation's budget.
pub struct Client {
    api: Box<dyn Api>,
    retry: RetryPolicy,
}

impl Client {
    /// Build a retrying HTTP client from connection settings.
    pub fn new(connection: &Connection, retry: RetryPolicy) -> Self {
        Self {
            api: Box::new(HttpApi::new(connection)),
            retry,
        }
    }

    /// Wrap an existing [`Api`] implementation (used by tests and fakes).
    pub fn with_api(api: Box<dyn Api>, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    /// The retry policy in effect for this invocation.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Retrying [`Api::list`].
    pub fn list(&self, path: &str, query: &[(&str, String)]) -> Result<Collection> {
        with_retry(&self.retry, || self.api.list(path, query))
    }

    /// Retrying [`Api::show`].
    pub fn show(&self, path: &str, include: Option<&str>) -> Result<Single> {
        with_retry(&self.retry, || self.api.show(path, include))
    }

    /// Retrying [`Api::create`].
    pub fn create(&self, path: &str, payload: &Value) -> Result<Single> {
        with_retry(&self.retry, || self.api.create(path, payload))
    }

    /// Retrying [`Api::update`].
    pub fn update(&self, path: &str, payload: &Value) -> Result<Single> {
        with_retry(&self.retry, || self.api.update(path, payload))
    }

    /// Retrying [`Api::destroy`].
    pub fn destroy(&self, path: &str) -> Result<Value> {
        with_retry(&self.retry, || self.api.destroy(path))
    }

    /// Retrying [`Api::action`].
    pub fn action(&self, path: &str, payload: Option<&Value>) -> Result<Value> {
        with_retry(&self.retry, || self.api.action(path, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Resource;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn test_url_building() {
        let api = HttpApi::new(&Connection::new("https://tfe.example.com/", "t"));
        assert_eq!(api.base_url(), "https://tfe.example.com");
        assert_eq!(
            api.url("organizations/acme/workspaces"),
            "https://tfe.example.com/api/v2/organizations/acme/workspaces"
        );
        assert_eq!(
            api.url("/runs/run-1/actions/apply"),
            "https://tfe.example.com/api/v2/runs/run-1/actions/apply"
        );
    }

    #[test]
    fn test_connection_builders() {
        let conn = Connection::new(DEFAULT_URL, "t").insecure(true).without_proxy(true);
        assert!(!conn.verify_tls);
        assert!(!conn.use_proxy);
    }

    /// Fails a fixed number of times, then serves an empty collection.
    struct Flaky {
        failures: Cell<u32>,
    }

    impl Api for Flaky {
        fn list(&self, _path: &str, _query: &[(&str, String)]) -> Result<Collection> {
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(Error::Network {
                    message: "connection reset".to_string(),
                });
            }
            Ok(Collection::default())
        }

        fn show(&self, _path: &str, _include: Option<&str>) -> Result<Single> {
            Ok(Single {
                data: Resource {
                    id: "x".to_string(),
                    kind: "things".to_string(),
                    attributes: serde_json::Map::new(),
                    relationships: None,
                    links: None,
                },
                included: vec![],
            })
        }

        fn create(&self, _path: &str, _payload: &Value) -> Result<Single> {
            self.show("", None)
        }

        fn update(&self, _path: &str, _payload: &Value) -> Result<Single> {
            self.show("", None)
        }

        fn destroy(&self, _path: &str) -> Result<Value> {
            Ok(Value::Null)
        }

        fn action(&self, _path: &str, _payload: Option<&Value>) -> Result<Value> {
            Ok(json!({}))
        }
    }

    #[test]
    fn test_client_retries_list() {
        let client = Client::with_api(
            Box::new(Flaky {
                failures: Cell::new(1),
            }),
            RetryPolicy::new(3, 0),
        );
        assert!(client.list("organizations", &[]).is_ok());
    }

    #[test]
    fn test_client_gives_up_after_budget() {
        let flaky = Flaky {
            failures: Cell::new(10),
        };
        let client = Client::with_api(Box::new(flaky), RetryPolicy::new(2, 0));
        let err = client.list("organizations", &[]).unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
