//! Sync-queue notification: recording pending local mutations for later replay.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::RequestDescriptor;
use crate::error::{RequestError, RequestErrorIntrospect};
use crate::path;
use crate::policy::{DataPolicy, Method};
use crate::request::{Request, RequestOptions};

/// One pending mutation recorded against an entity id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEntry {
    pub request: RequestDescriptor,
    pub lmt: Option<String>,
}

/// The per-collection pending-operations document persisted in the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncCollection {
    #[serde(rename = "_id")]
    pub id: String,
    pub documents: HashMap<String, SyncEntry>,
    pub size: usize,
}

impl SyncCollection {
    fn empty(collection: &str) -> Self {
        Self {
            id: collection.to_string(),
            documents: HashMap::new(),
            size: 0,
        }
    }
}

fn extract_lmt(item: &Value) -> Option<String> {
    item.get("_kmd")
        .and_then(|kmd| kmd.get("lmt"))
        .and_then(|lmt| lmt.as_str())
        .map(str::to_string)
}

/// Normalize `data` to a slice of items, per §4.3: a bare object is treated
/// as a one-element array.
fn as_items(data: &Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// After a successful local mutation with `skip_sync == false`, read (or
/// create) the collection's sync document, record this request against every
/// item's `_id`, and persist it back.
pub async fn notify_sync(request: &Request, data: &Value) -> Result<(), RequestError> {
    let parts = path::parse(&request.pathname)?;
    let sync_pathname = format!(
        "/{}/{}/{}/{}",
        parts.namespace, parts.app_id, request.client.config.sync_collection_name, parts.collection
    );

    let read_options = RequestOptions {
        method: Some(Method::Get),
        pathname: Some(sync_pathname.clone()),
        data_policy: Some(DataPolicy::LocalOnly),
        skip_sync: true,
        auth: request.auth.clone(),
        ..Default::default()
    };
    let mut read_request = Request::new(request.client.clone(), read_options)?;

    let mut collection_doc = match Box::pin(read_request.execute()).await {
        Ok(response) => serde_json::from_value(response.data)
            .map_err(|e| RequestError::generic(format!("Invalid sync document: {}", e)))?,
        Err(e) if e.is_not_found() => SyncCollection::empty(&parts.collection),
        Err(e) => return Err(e),
    };

    for item in as_items(data) {
        let id = match item.get("_id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => continue,
        };
        if !collection_doc.documents.contains_key(&id) {
            collection_doc.size += 1;
        }
        collection_doc.documents.insert(
            id,
            SyncEntry {
                request: request.to_descriptor(),
                lmt: extract_lmt(&item),
            },
        );
    }

    let write_options = RequestOptions {
        method: Some(Method::Put),
        pathname: Some(sync_pathname),
        data: Some(serde_json::to_value(&collection_doc).map_err(|e| {
            RequestError::generic(format!("Could not serialize sync document: {}", e))
        })?),
        data_policy: Some(DataPolicy::LocalOnly),
        skip_sync: true,
        auth: request.auth.clone(),
        ..Default::default()
    };
    let mut write_request = Request::new(request.client.clone(), write_options)?;
    Box::pin(write_request.execute()).await?;

    Ok(())
}
