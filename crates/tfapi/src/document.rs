//! JSON:API envelope types.
//!
//! Every endpoint of the remote API answers with a `data` object (or array
//! of objects) carrying `id`, `type`, `attributes` and `relationships`,
//! optionally accompanied by `included` side-loads and pagination metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single remote resource.
///
/// Identifiers are unique within a resource-type collection at any instant,
/// but are not stable across resource recreation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
}

impl Resource {
    /// Look up an attribute by name.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Look up a string attribute by name.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(Value::as_str)
    }

    /// The `name` attribute, when present.
    pub fn name(&self) -> Option<&str> {
        self.attr_str("name")
    }

    /// The ID of a to-one relationship, e.g. `ssh-key` on a workspace.
    ///
    /// Returns `None` when the relationship is missing or its `data` is
    /// null (an unassigned relationship).
    pub fn relationship_id(&self, name: &str) -> Option<&str> {
        self.relationships
            .as_ref()?
            .get(name)?
            .get("data")?
            .get("id")?
            .as_str()
    }
}

/// Pagination block under `meta.pagination`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(rename = "current-page")]
    pub current_page: u32,
    #[serde(rename = "next-page")]
    pub next_page: Option<u32>,
    #[serde(rename = "total-pages", default)]
    pub total_pages: u32,
}

/// Response metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// A collection response: `data` is an array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub data: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Collection {
    /// Append another page, keeping this collection's metadata.
    pub fn extend(&mut self, page: Collection) {
        self.data.extend(page.data);
        self.included.extend(page.included);
    }

    /// Find a resource by its canonical ID.
    pub fn by_id(&self, id: &str) -> Option<&Resource> {
        self.data.iter().find(|r| r.id == id)
    }

    /// Remove duplicate resources from `data` and `included`.
    ///
    /// Keeps the position of the first occurrence per ID; a later occurrence
    /// replaces the earlier value in place.
    pub fn dedup_by_id(&mut self) {
        dedup(&mut self.data);
        dedup(&mut self.included);
    }
}

fn dedup(items: &mut Vec<Resource>) {
    let mut by_id: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut kept: Vec<Resource> = Vec::with_capacity(items.len());

    for item in items.drain(..) {
        match by_id.get(&item.id) {
            Some(&index) => kept[index] = item,
            None => {
                by_id.insert(item.id.clone(), kept.len());
                kept.push(item);
            }
        }
    }

    *items = kept;
}

/// A single-resource response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Single {
    pub data: Resource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Resource>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(id: &str, kind: &str, attributes: Value) -> Resource {
        serde_json::from_value(json!({
            "id": id,
            "type": kind,
            "attributes": attributes,
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_collection() {
        let doc: Collection = serde_json::from_value(json!({
            "data": [
                {
                    "id": "ws-1",
                    "type": "workspaces",
                    "attributes": { "name": "net-prod", "locked": false },
                    "relationships": {
                        "ssh-key": { "data": { "id": "sshkey-9", "type": "ssh-keys" } }
                    }
                }
            ],
            "meta": { "pagination": { "current-page": 1, "next-page": null, "total-pages": 1 } }
        }))
        .unwrap();

        assert_eq!(doc.data.len(), 1);
        let ws = &doc.data[0];
        assert_eq!(ws.kind, "workspaces");
        assert_eq!(ws.name(), Some("net-prod"));
        assert_eq!(ws.attr("locked"), Some(&json!(false)));
        assert_eq!(ws.relationship_id("ssh-key"), Some("sshkey-9"));
        let pagination = doc.meta.unwrap().pagination.unwrap();
        assert_eq!(pagination.next_page, None);
    }

    #[test]
    fn test_relationship_id_null_data() {
        let ws: Resource = serde_json::from_value(json!({
            "id": "ws-2",
            "type": "workspaces",
            "attributes": {},
            "relationships": { "ssh-key": { "data": null } }
        }))
        .unwrap();
        assert_eq!(ws.relationship_id("ssh-key"), None);
    }

    #[test]
    fn test_by_id() {
        let doc = Collection {
            data: vec![
                resource("a", "teams", json!({"name": "one"})),
                resource("b", "teams", json!({"name": "two"})),
            ],
            ..Default::default()
        };
        assert_eq!(doc.by_id("b").unwrap().name(), Some("two"));
        assert!(doc.by_id("c").is_none());
    }

    #[test]
    fn test_dedup_keeps_first_position_last_value() {
        let mut doc = Collection {
            data: vec![
                resource("run-1", "runs", json!({"message": "old"})),
                resource("run-2", "runs", json!({"message": "keep"})),
                resource("run-1", "runs", json!({"message": "new"})),
            ],
            ..Default::default()
        };
        doc.dedup_by_id();

        assert_eq!(doc.data.len(), 2);
        assert_eq!(doc.data[0].id, "run-1");
        assert_eq!(doc.data[0].attr_str("message"), Some("new"));
        assert_eq!(doc.data[1].id, "run-2");
    }

    #[test]
    fn test_single_roundtrip_omits_empty_included() {
        let single = Single {
            data: resource("org-1", "organizations", json!({"name": "acme"})),
            included: vec![],
        };
        let value = serde_json::to_value(&single).unwrap();
        assert!(value.get("included").is_none());
        assert_eq!(value["data"]["type"], "organizations");
    }
}
