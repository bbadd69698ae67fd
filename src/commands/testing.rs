//! In-memory API fake for driver-level tests.
//!
//! Serves canned collections and singles by path and records every
//! mutating call, so tests can assert both the decision (`changed`) and
//! the absence of writes under no-op and dry-run conditions.

use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tfapi::error::{Error, Result};
use tfapi::{Api, Client, Collection, Resource, RetryPolicy, Single};

/// Build a resource from id, type, and an attributes object.
pub fn resource(id: &str, kind: &str, attributes: Value) -> Resource {
    let attributes = if attributes.is_object() {
        attributes
    } else {
        json!({})
    };
    serde_json::from_value(json!({
        "id": id,
        "type": kind,
        "attributes": attributes,
    }))
    .unwrap()
}

/// Same as [`resource`], with a relationships object attached.
pub fn resource_with_relationships(
    id: &str,
    kind: &str,
    attributes: Value,
    relationships: Value,
) -> Resource {
    serde_json::from_value(json!({
        "id": id,
        "type": kind,
        "attributes": attributes,
        "relationships": relationships,
    }))
    .unwrap()
}

#[derive(Default)]
pub struct FakeApi {
    collections: HashMap<String, Vec<Resource>>,
    singles: HashMap<String, Resource>,
    failing_lists: Vec<String>,
    mutations: Rc<RefCell<Vec<String>>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `resources` for `list(path)`.
    #[must_use]
    pub fn with_collection(mut self, path: &str, resources: Vec<Resource>) -> Self {
        self.collections.insert(path.to_string(), resources);
        self
    }

    /// Serve `resource` for `show(path)`.
    #[must_use]
    pub fn with_single(mut self, path: &str, resource: Resource) -> Self {
        self.singles.insert(path.to_string(), resource);
        self
    }

    /// Make `list(path)` fail with an API error.
    #[must_use]
    pub fn with_failing_list(mut self, path: &str) -> Self {
        self.failing_lists.push(path.to_string());
        self
    }

    /// Shared handle to the recorded mutating calls.
    pub fn mutations(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.mutations)
    }

    /// Wrap this fake in a non-retrying client.
    pub fn into_client(self) -> Client {
        Client::with_api(Box::new(self), RetryPolicy::no_retry())
    }

    fn record(&self, verb: &str, path: &str) {
        self.mutations.borrow_mut().push(format!("{verb} {path}"));
    }
}

impl Api for FakeApi {
    fn list(&self, path: &str, _query: &[(&str, String)]) -> Result<Collection> {
        if self.failing_lists.iter().any(|p| p == path) {
            return Err(Error::Api {
                status: 401,
                message: "unauthorized".to_string(),
            });
        }
        Ok(Collection {
            data: self.collections.get(path).cloned().unwrap_or_default(),
            ..Collection::default()
        })
    }

    fn show(&self, path: &str, _include: Option<&str>) -> Result<Single> {
        match self.singles.get(path) {
            Some(resource) => Ok(Single {
                data: resource.clone(),
                included: vec![],
            }),
            None => Err(Error::Api {
                status: 404,
                message: format!("{path} not found"),
            }),
        }
    }

    fn create(&self, path: &str, payload: &Value) -> Result<Single> {
        self.record("POST", path);
        let kind = payload["data"]["type"].as_str().unwrap_or("things");
        let attributes = payload["data"]["attributes"].clone();
        Ok(Single {
            data: resource("new-1", kind, attributes),
            included: vec![],
        })
    }

    fn update(&self, path: &str, payload: &Value) -> Result<Single> {
        self.record("PATCH", path);
        let kind = payload["data"]["type"].as_str().unwrap_or("things");
        let attributes = payload["data"]["attributes"].clone();
        Ok(Single {
            data: resource("updated-1", kind, attributes),
            included: vec![],
        })
    }

    fn destroy(&self, path: &str) -> Result<Value> {
        self.record("DELETE", path);
        Ok(Value::Null)
    }

    fn action(&self, path: &str, _payload: Option<&Value>) -> Result<Value> {
        self.record("POST", path);
        Ok(json!({}))
    }
}
