//! Shared, borrowed configuration: protocol/host and the two racks.
use std::sync::Arc;

use crate::config::Config;
use crate::error::RequestError;
use crate::rack::Rack;

/// Shared client configuration. Cheaply cloneable (everything behind `Arc`);
/// `Request`s borrow it rather than own it, as sub-requests synthesized by
/// the policy dispatcher share only this reference.
#[derive(Clone)]
pub struct Client {
    pub protocol: String,
    pub host: String,
    pub namespace: String,
    pub app_id: String,
    pub config: Config,
    pub device_information: String,
    cache_rack: Option<Arc<dyn Rack>>,
    network_rack: Option<Arc<dyn Rack>>,
}

impl Client {
    pub fn new(
        protocol: impl Into<String>,
        host: impl Into<String>,
        namespace: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            namespace: namespace.into(),
            app_id: app_id.into(),
            config: Config::default(),
            device_information: "kinvey-request-core/js-sdk-analog".to_string(),
            cache_rack: None,
            network_rack: None,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_cache_rack(mut self, rack: Arc<dyn Rack>) -> Self {
        self.cache_rack = Some(rack);
        self
    }

    pub fn with_network_rack(mut self, rack: Arc<dyn Rack>) -> Self {
        self.network_rack = Some(rack);
        self
    }

    pub fn cache_rack(&self) -> Result<Arc<dyn Rack>, RequestError> {
        self.cache_rack
            .clone()
            .ok_or_else(|| RequestError::generic("Client configured without a cache rack"))
    }

    pub fn network_rack(&self) -> Result<Arc<dyn Rack>, RequestError> {
        self.network_rack
            .clone()
            .ok_or_else(|| RequestError::generic("Client configured without a network rack"))
    }
}
