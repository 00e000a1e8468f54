//! The central `Request` object: construction, mutators, and `execute()`.
use std::collections::HashMap;

use serde_json::Value;

use crate::auth::Auth;
use crate::client::Client;
use crate::descriptor::RequestDescriptor;
use crate::error::{ErrorEnvelope, RequestError, RequestErrorIntrospect};
use crate::headers::{self, HeaderMap};
use crate::policy::{DataPolicy, Method, ResponseType};
use crate::properties::RequestProperties;
use crate::response::Response;
use crate::sync;

/// Options accepted by [`Request::new`]. Fields left `None`/default take the
/// values documented in §4.1.
#[derive(Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub pathname: Option<String>,
    pub query: Option<Value>,
    pub search: HashMap<String, String>,
    pub data: Option<Value>,
    pub data_policy: Option<DataPolicy>,
    pub response_type: Option<ResponseType>,
    pub timeout: Option<u64>,
    pub skip_sync: bool,
    pub content_type: Option<String>,
    pub skip_bl: bool,
    pub trace: bool,
    pub auth: Auth,
}

/// A single data operation against a hierarchical resource path, satisfied
/// against a local cache and/or a remote network backend per `data_policy`.
///
/// Not re-entrant: `execute()` on a `Request` already executing fails with
/// `AlreadyExecuting`, and `&mut self` prevents two overlapping calls in safe
/// Rust regardless.
#[derive(Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub protocol: String,
    pub host: String,
    pub pathname: String,
    pub(crate) query: Option<Value>,
    pub(crate) search: HashMap<String, String>,
    pub(crate) data: Value,
    pub(crate) headers: HeaderMap,
    pub(crate) response_type: ResponseType,
    pub client: Client,
    pub(crate) auth: Auth,
    pub data_policy: DataPolicy,
    pub timeout: u64,
    executing: bool,
    pub skip_sync: bool,
    pub(crate) request_properties: RequestProperties,
}

impl Request {
    pub fn new(client: Client, options: RequestOptions) -> Result<Self, RequestError> {
        let timeout = options.timeout.unwrap_or(client.config.default_timeout_ms);
        let mut request = Request {
            method: options.method.unwrap_or(Method::Get),
            protocol: client.protocol.clone(),
            host: client.host.clone(),
            pathname: options.pathname.unwrap_or_else(|| "/".to_string()),
            query: options.query,
            search: options.search,
            data: Value::Null,
            headers: HeaderMap::new(),
            response_type: options.response_type.unwrap_or_default(),
            data_policy: options.data_policy.unwrap_or(DataPolicy::PreferLocal),
            timeout,
            executing: false,
            skip_sync: options.skip_sync,
            request_properties: RequestProperties::new(),
            auth: options.auth,
            client,
        };

        request.headers.set(headers::ACCEPT, "application/json");
        request.headers.set(
            headers::X_KINVEY_API_VERSION,
            request.client.config.api_version.to_string(),
        );
        request.headers.set(
            headers::X_KINVEY_DEVICE_INFORMATION,
            request.client.device_information.clone(),
        );
        if let Some(content_type) = &options.content_type {
            request
                .headers
                .set(headers::X_KINVEY_CONTENT_TYPE, content_type.clone());
        }
        if options.skip_bl {
            request
                .headers
                .set(headers::X_KINVEY_SKIP_BUSINESS_LOGIC, "true");
        }
        if options.trace {
            request.headers.set(
                headers::X_KINVEY_INCLUDE_HEADERS_IN_RESPONSE,
                headers::X_KINVEY_REQUEST_ID,
            );
            request
                .headers
                .set(headers::X_KINVEY_RESPONSE_WRAPPER, "true");
        }

        if let Some(data) = options.data {
            request.set_data(data);
        }

        Ok(request)
    }

    // --- mutators -----------------------------------------------------

    pub fn set_method(&mut self, method: &str) -> Result<(), RequestError> {
        self.method = Method::parse(method)?;
        Ok(())
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn set_data(&mut self, data: Value) {
        match &data {
            Value::Null => self.headers.remove(headers::CONTENT_TYPE),
            _ => {
                if !self.headers.has(headers::CONTENT_TYPE) {
                    self.headers
                        .set(headers::CONTENT_TYPE, "application/json; charset=utf-8");
                }
            }
        }
        self.data = data;
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn set_response_type(&mut self, response_type: ResponseType) {
        self.response_type = response_type;
    }

    pub fn set_request_properties(&mut self, props: RequestProperties) -> Result<(), RequestError> {
        props.validate(self.client.config.max_custom_props_bytes)?;
        match &props.app_version {
            Some(version) => self
                .headers
                .set(headers::X_KINVEY_CLIENT_APP_VERSION, version.clone()),
            None => self.headers.remove(headers::X_KINVEY_CLIENT_APP_VERSION),
        }
        self.headers
            .set(headers::X_KINVEY_CUSTOM_REQUEST_PROPERTIES, props.serialized());
        self.request_properties = props;
        Ok(())
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.remove(name);
    }

    pub fn clear_headers(&mut self) {
        self.headers.clear();
    }

    pub fn url(&self) -> String {
        format!("{}://{}{}", self.protocol, self.host, self.pathname)
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    pub fn to_descriptor(&self) -> RequestDescriptor {
        RequestDescriptor {
            method: self.method,
            headers: self.headers.to_plain_map(),
            url: self.url(),
            pathname: self.pathname.clone(),
            query: self.query.clone(),
            search: self.search.clone(),
            data: self.data.clone(),
            response_type: self.response_type.transport_hint().to_string(),
            timeout: self.timeout,
        }
    }

    /// `abort()` is unimplemented; in-flight cancellation is an open design question.
    pub fn abort(&self) -> Result<(), RequestError> {
        Err(RequestError::generic("Method not supported"))
    }

    // --- sub-request construction --------------------------------------

    /// Clone the fields shared by every sub-request the dispatcher
    /// synthesizes: pathname, query, search, auth, client, response_type,
    /// timeout. The caller overrides `data_policy`/`method`/`data` as needed.
    pub(crate) fn derive(&self, data_policy: DataPolicy, method: Method) -> Request {
        let mut headers = self.headers.clone();
        headers.remove(headers::AUTHORIZATION);
        Request {
            method,
            protocol: self.protocol.clone(),
            host: self.host.clone(),
            pathname: self.pathname.clone(),
            query: self.query.clone(),
            search: self.search.clone(),
            data: Value::Null,
            headers,
            response_type: self.response_type,
            client: self.client.clone(),
            auth: self.auth.clone(),
            data_policy,
            timeout: self.timeout,
            executing: false,
            skip_sync: self.skip_sync,
            request_properties: self.request_properties.clone(),
        }
    }

    pub(crate) fn with_query(&self, query: Option<Value>) -> Request {
        let mut sub = self.derive(self.data_policy, self.method);
        sub.query = query;
        sub
    }

    // --- rack calls -----------------------------------------------------

    pub(crate) async fn execute_local(&self) -> Result<Response, RequestError> {
        self.client
            .cache_rack()?
            .execute(self.to_descriptor())
            .await
    }

    pub(crate) async fn execute_network(&self) -> Result<Response, RequestError> {
        self.client
            .network_rack()?
            .execute(self.to_descriptor())
            .await
    }

    pub(crate) fn set_executing(&mut self, executing: bool) {
        self.executing = executing;
    }

    pub(crate) fn resolve_credentials(&mut self) {
        if let Some(descriptor) = self.auth.resolve(&self.client) {
            let (scheme, credentials) = descriptor.resolve();
            self.headers
                .set(headers::AUTHORIZATION, format!("{} {}", scheme, credentials));
        }
    }

    // --- execution state machine -----------------------------------------

    pub async fn execute(&mut self) -> Result<Response, RequestError> {
        if self.executing {
            warn!("request already executing"; "pathname" => self.pathname.clone());
            return Err(RequestError::already_executing());
        }
        self.executing = true;
        let result = self.execute_inner().await;
        self.executing = false;
        if let Err(ref e) = result {
            error!("request execution failed"; "pathname" => self.pathname.clone(), "error" => e.to_string());
        }
        result
    }

    async fn execute_inner(&mut self) -> Result<Response, RequestError> {
        self.resolve_credentials();

        let response = self.dispatch().await?;
        self.finalize(response)
    }

    async fn dispatch(&mut self) -> Result<Option<Response>, RequestError> {
        match self.data_policy {
            DataPolicy::LocalOnly => Ok(Some(self.execute_local().await?)),
            DataPolicy::ForceLocal => self.dispatch_force_local().await,
            DataPolicy::ForceNetwork => Ok(Some(self.execute_network().await?)),
            DataPolicy::PreferLocal if self.method == Method::Get => {
                self.dispatch_prefer_local_get().await
            }
            DataPolicy::PreferLocal => self.dispatch_prefer_local_write().await,
            DataPolicy::PreferNetwork => self.dispatch_prefer_network().await,
        }
    }

    async fn dispatch_force_local(&mut self) -> Result<Option<Response>, RequestError> {
        let response = self.execute_local().await?;
        if response.is_success() && self.method != Method::Get && !self.skip_sync {
            sync::notify_sync(self, &response.data).await?;
        }
        Ok(Some(response))
    }

    async fn dispatch_prefer_local_get(&mut self) -> Result<Option<Response>, RequestError> {
        let local_result = self.execute_local().await;
        let response = match local_result {
            Ok(response) => response,
            Err(e) if e.is_not_found() => Response::not_found_empty_array(),
            Err(e) => return Err(e),
        };

        if response.is_success() {
            return Ok(Some(response));
        }

        info!("prefer-local GET escalating to network"; "pathname" => self.pathname.clone());
        let mut escalation = self.derive(DataPolicy::PreferNetwork, Method::Get);
        escalation.set_data(response.data);
        Ok(Some(Box::pin(escalation.execute()).await?))
    }

    async fn dispatch_prefer_local_write(&mut self) -> Result<Option<Response>, RequestError> {
        let mut net_sub = self.derive(DataPolicy::PreferNetwork, self.method);
        net_sub.set_data(self.data.clone());
        match Box::pin(net_sub.execute()).await {
            Ok(response) => Ok(Some(response)),
            Err(network_error) => {
                // Net-failure still needs the change to persist offline.
                let mut local_sub = self.derive(DataPolicy::ForceLocal, self.method);
                local_sub.set_data(self.data.clone());
                let _ = Box::pin(local_sub.execute()).await;
                Err(network_error)
            }
        }
    }

    async fn dispatch_prefer_network(&mut self) -> Result<Option<Response>, RequestError> {
        let response = self.execute_network().await?;

        if response.is_success() {
            let mirror_method = if self.method == Method::Get {
                Method::Put
            } else {
                self.method
            };
            let mut mirror = self.derive(DataPolicy::ForceLocal, mirror_method);
            mirror.set_data(response.data.clone());
            // Awaited before the network response is returned, so a
            // subsequent read observes the mirror — but its failure must
            // never mask an otherwise-successful network response.
            if let Err(e) = Box::pin(mirror.execute()).await {
                warn!("cache mirror write failed"; "pathname" => self.pathname.clone(), "error" => e.to_string());
            }
            return Ok(Some(response));
        }

        if self.method == Method::Get {
            let mut fallback = self.derive(DataPolicy::ForceLocal, Method::Get);
            fallback.set_data(response.data.clone());
            return Ok(Some(Box::pin(fallback.execute()).await?));
        }

        Ok(Some(response))
    }

    fn finalize(&self, response: Option<Response>) -> Result<Response, RequestError> {
        let response = response.ok_or_else(RequestError::no_response)?;
        if !response.is_success() {
            let envelope: ErrorEnvelope =
                serde_json::from_value(response.data.clone()).unwrap_or(ErrorEnvelope {
                    name: None,
                    message: None,
                    description: None,
                    error: None,
                    debug: None,
                });
            return Err(envelope.into_error());
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::descriptor::RequestDescriptor;
    use crate::rack::Rack;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// A cache rack that starts empty: `GET` misses with `NotFound` until
    /// something has been written, after which it echoes the stored value
    /// back for any method.
    #[derive(Default)]
    struct RecordingCache {
        doc: Mutex<Option<Value>>,
    }

    #[async_trait]
    impl Rack for RecordingCache {
        async fn execute(&self, descriptor: RequestDescriptor) -> Result<Response, RequestError> {
            match descriptor.method {
                Method::Get => match self.doc.lock().unwrap().clone() {
                    Some(value) => Ok(Response::new(200, Default::default(), value)),
                    None => Err(RequestError::not_found()),
                },
                _ => {
                    *self.doc.lock().unwrap() = Some(descriptor.data);
                    Ok(Response::new(200, Default::default(), Value::Null))
                }
            }
        }
    }

    struct StaticNetwork {
        body: Value,
    }

    #[async_trait]
    impl Rack for StaticNetwork {
        async fn execute(&self, _descriptor: RequestDescriptor) -> Result<Response, RequestError> {
            Ok(Response::new(200, Default::default(), self.body.clone()))
        }
    }

    struct FailingNetwork;

    #[async_trait]
    impl Rack for FailingNetwork {
        async fn execute(&self, _descriptor: RequestDescriptor) -> Result<Response, RequestError> {
            Err(RequestError::generic("network down"))
        }
    }

    struct NeverCalled;

    #[async_trait]
    impl Rack for NeverCalled {
        async fn execute(&self, _descriptor: RequestDescriptor) -> Result<Response, RequestError> {
            panic!("this rack should not be called");
        }
    }

    // Scenario 2: PreferLocal GET, cache miss, network hit, cache backfilled.
    #[tokio::test]
    async fn prefer_local_get_escalates_to_network_on_cache_miss() {
        let cache = Arc::new(RecordingCache::default());
        let client = Client::new("https", "baas.kinvey.com", "appdata", "app1")
            .with_cache_rack(cache.clone())
            .with_network_rack(Arc::new(StaticNetwork {
                body: json!({"_id": "b1"}),
            }));
        let options = RequestOptions {
            method: Some(Method::Get),
            pathname: Some("/appdata/app1/books/b1".to_string()),
            data_policy: Some(DataPolicy::PreferLocal),
            ..Default::default()
        };
        let mut request = Request::new(client, options).unwrap();
        let response = request.execute().await.unwrap();
        assert_eq!(response.data, json!({"_id": "b1"}));
        assert_eq!(cache.doc.lock().unwrap().clone(), Some(json!({"_id": "b1"})));
    }

    // Scenario 3: PreferNetwork GET mirrors the network body into the cache
    // and still returns the network body.
    #[tokio::test]
    async fn prefer_network_get_mirrors_success_into_cache() {
        let cache = Arc::new(RecordingCache::default());
        let network_body = json!([{"_id": "b1"}, {"_id": "b2"}]);
        let client = Client::new("https", "baas.kinvey.com", "appdata", "app1")
            .with_cache_rack(cache.clone())
            .with_network_rack(Arc::new(StaticNetwork {
                body: network_body.clone(),
            }));
        let options = RequestOptions {
            method: Some(Method::Get),
            pathname: Some("/appdata/app1/books".to_string()),
            data_policy: Some(DataPolicy::PreferNetwork),
            ..Default::default()
        };
        let mut request = Request::new(client, options).unwrap();
        let response = request.execute().await.unwrap();
        assert_eq!(response.data, network_body);
        assert_eq!(cache.doc.lock().unwrap().clone(), Some(network_body));
    }

    // A failed cache mirror must not mask a successful network response.
    #[tokio::test]
    async fn prefer_network_get_survives_a_failing_mirror_write() {
        struct RejectingCache;
        #[async_trait]
        impl Rack for RejectingCache {
            async fn execute(&self, _: RequestDescriptor) -> Result<Response, RequestError> {
                Err(RequestError::generic("disk full"))
            }
        }
        let network_body = json!({"_id": "b1"});
        let client = Client::new("https", "baas.kinvey.com", "appdata", "app1")
            .with_cache_rack(Arc::new(RejectingCache))
            .with_network_rack(Arc::new(StaticNetwork {
                body: network_body.clone(),
            }));
        let options = RequestOptions {
            method: Some(Method::Get),
            pathname: Some("/appdata/app1/books/b1".to_string()),
            data_policy: Some(DataPolicy::PreferNetwork),
            ..Default::default()
        };
        let mut request = Request::new(client, options).unwrap();
        let response = request.execute().await.unwrap();
        assert_eq!(response.data, network_body);
    }

    // PreferLocal, non-GET: network failure still leaves the write durable offline.
    #[tokio::test]
    async fn prefer_local_write_falls_back_to_offline_mirror_on_network_failure() {
        let cache = Arc::new(RecordingCache::default());
        let client = Client::new("https", "baas.kinvey.com", "appdata", "app1")
            .with_cache_rack(cache.clone())
            .with_network_rack(Arc::new(FailingNetwork));
        let options = RequestOptions {
            method: Some(Method::Post),
            pathname: Some("/appdata/app1/books".to_string()),
            data: Some(json!({"_id": "b1", "title": "T"})),
            data_policy: Some(DataPolicy::PreferLocal),
            ..Default::default()
        };
        let mut request = Request::new(client, options).unwrap();
        let err = request.execute().await.unwrap_err();
        assert_eq!(err.to_string(), "network down");
        assert_eq!(
            cache.doc.lock().unwrap().clone(),
            Some(json!({"_id": "b1", "title": "T"}))
        );
    }

    #[tokio::test]
    async fn force_network_never_touches_the_cache() {
        let client = Client::new("https", "baas.kinvey.com", "appdata", "app1")
            .with_cache_rack(Arc::new(NeverCalled))
            .with_network_rack(Arc::new(StaticNetwork {
                body: json!({"_id": "b1"}),
            }));
        let options = RequestOptions {
            method: Some(Method::Get),
            pathname: Some("/appdata/app1/books/b1".to_string()),
            data_policy: Some(DataPolicy::ForceNetwork),
            ..Default::default()
        };
        let mut request = Request::new(client, options).unwrap();
        let response = request.execute().await.unwrap();
        assert_eq!(response.data, json!({"_id": "b1"}));
    }

    // Scenario 5: a second execute() on an already-executing request rejects
    // with AlreadyExecuting instead of running.
    #[tokio::test]
    async fn already_executing_request_rejects_reentry() {
        let client = Client::new("https", "baas.kinvey.com", "appdata", "app1")
            .with_cache_rack(Arc::new(NeverCalled))
            .with_network_rack(Arc::new(NeverCalled));
        let options = RequestOptions {
            method: Some(Method::Get),
            pathname: Some("/appdata/app1/books/b1".to_string()),
            data_policy: Some(DataPolicy::LocalOnly),
            ..Default::default()
        };
        let mut request = Request::new(client, options).unwrap();
        request.set_executing(true);
        let err = request.execute().await.unwrap_err();
        assert!(err.is_already_executing());
    }
}
