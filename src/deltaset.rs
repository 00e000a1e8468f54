//! `DeltaSetRequest`: delta-set synchronization for `GET + PreferNetwork`.
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::DateTime;
use futures::future::join_all;
use serde_json::{json, Value};

use crate::error::{RequestError, RequestErrorIntrospect};
use crate::headers::{self, HeaderMap};
use crate::policy::{DataPolicy, Method};
use crate::request::Request;
use crate::response::Response;

/// `derive()`/`with_query()` strip `Authorization` since their normal path is
/// to run through `.execute()`, which re-resolves it. The projected-query
/// probes below call `execute_local`/`execute_network` directly, bypassing
/// that, so the credentials resolved onto `source` must be copied across.
fn carry_credentials(source: &Request, probe: &mut Request) {
    if let Some(value) = source.get_header(headers::AUTHORIZATION) {
        probe.set_header(headers::AUTHORIZATION, value.to_string());
    }
}

/// A `Request` specialized for delta-set GETs. Delegates to the base
/// `execute()` for every combination other than `PreferNetwork` + `GET`.
pub struct DeltaSetRequest {
    pub inner: Request,
}

impl DeltaSetRequest {
    pub fn new(inner: Request) -> Self {
        Self { inner }
    }

    pub async fn execute(&mut self) -> Result<Response, RequestError> {
        if self.inner.data_policy != DataPolicy::PreferNetwork || self.inner.method() != Method::Get
        {
            return self.inner.execute().await;
        }

        if self.inner.is_executing() {
            return Err(RequestError::already_executing());
        }

        self.inner.set_executing(true);
        let result = self.execute_delta_set().await;
        self.inner.set_executing(false);
        result
    }

    async fn execute_delta_set(&mut self) -> Result<Response, RequestError> {
        self.inner.resolve_credentials();
        let orig_query = self.inner.clone_query();
        let projected = projection_query();

        let mut local_probe = self.inner.with_query(Some(projected.clone()));
        carry_credentials(&self.inner, &mut local_probe);
        let local_items = match local_probe.execute_local().await {
            Ok(response) => as_array(&response.data),
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => {
                self.inner.set_query(orig_query);
                return Err(e);
            }
        };

        let mut network_probe = self.inner.with_query(Some(projected));
        carry_credentials(&self.inner, &mut network_probe);
        let network_response = match network_probe.execute_network().await {
            Ok(response) => response,
            Err(e) => {
                self.inner.set_query(orig_query);
                return Err(e);
            }
        };

        if !network_response.is_success() {
            self.inner.set_query(orig_query);
            return self.inner.execute().await;
        }
        let network_items = as_array(&network_response.data);

        let local_by_id = index_by_id(&local_items);
        let network_by_id = index_by_id(&network_items);

        let mut delta_ids = Vec::new();
        for (id, item) in &network_by_id {
            match local_by_id.get(id) {
                None => delta_ids.push(id.clone()),
                Some(local_item) if is_changed(local_item, item) => delta_ids.push(id.clone()),
                Some(_) => {}
            }
        }
        let delta_set: HashSet<&String> = delta_ids.iter().collect();
        let unchanged_local_ids: Vec<String> = local_by_id
            .keys()
            .filter(|id| !delta_set.contains(id))
            .cloned()
            .collect();

        let max_batch = self.inner.client.config.max_ids_per_request;
        let network_batches = batch(&delta_ids, max_batch);
        let local_batches = batch(&unchanged_local_ids, max_batch);

        let mut futures = Vec::new();
        for ids in network_batches {
            let sub = self
                .inner
                .derive_for_batch(DataPolicy::PreferNetwork, &orig_query, &ids);
            futures.push(run_sub(sub));
        }
        for ids in local_batches {
            let sub = self
                .inner
                .derive_for_batch(DataPolicy::ForceLocal, &orig_query, &ids);
            futures.push(run_sub(sub));
        }

        let results = join_all(futures).await;
        self.inner.set_query(orig_query);

        let mut combined = Vec::new();
        let mut headers = HeaderMap::new();
        for result in results {
            let response = result?;
            combined.extend(as_array(&response.data));
            for (k, v) in response.headers.iter() {
                headers.set(k, v);
            }
        }

        Ok(Response::new(200, headers, Value::Array(combined)))
    }
}

async fn run_sub(mut request: Request) -> Result<Response, RequestError> {
    request.execute().await
}

fn projection_query() -> Value {
    json!({"fields": ["_id", "_kmd"]})
}

fn as_array(data: &Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

fn index_by_id(items: &[Value]) -> HashMap<String, Value> {
    items
        .iter()
        .filter_map(|item| {
            item.get("_id")
                .and_then(Value::as_str)
                .map(|id| (id.to_string(), item.clone()))
        })
        .collect()
}

fn lmt_of(item: &Value) -> Option<String> {
    item.get("_kmd")
        .and_then(|kmd| kmd.get("lmt"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn compare_lmt(a: &str, b: &str) -> Ordering {
    match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// §4.4 step 5: a network id is "changed" iff it is absent locally, or its
/// lmt is newer than the local copy's. Equal lmts are up to date. Missing
/// `_kmd` on exactly one side counts as changed.
fn is_changed(local_item: &Value, network_item: &Value) -> bool {
    match (lmt_of(local_item), lmt_of(network_item)) {
        (Some(local_lmt), Some(network_lmt)) => {
            compare_lmt(&network_lmt, &local_lmt) == Ordering::Greater
        }
        (None, None) => false,
        _ => true,
    }
}

fn batch(ids: &[String], size: usize) -> Vec<Vec<String>> {
    if ids.is_empty() {
        return Vec::new();
    }
    ids.chunks(size.max(1)).map(|c| c.to_vec()).collect()
}

fn with_id_filter(orig_query: &Option<Value>, ids: &[String]) -> Value {
    json!({
        "and": [
            orig_query,
            {"_id": {"$in": ids}},
        ],
    })
}

impl Request {
    fn clone_query(&self) -> Option<Value> {
        self.query.clone()
    }

    fn set_query(&mut self, query: Option<Value>) {
        self.query = query;
    }

    fn derive_for_batch(
        &self,
        policy: DataPolicy,
        orig_query: &Option<Value>,
        ids: &[String],
    ) -> Request {
        let mut sub = self.derive(policy, Method::Get);
        sub.query = Some(with_id_filter(orig_query, ids));
        sub
    }
}
