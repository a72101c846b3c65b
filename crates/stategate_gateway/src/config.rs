//! Gateway configuration.

/// Configuration for the synchronization gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Backend collection shared-state documents are filed under.
    /// Part of the wire-level document identity
    /// (`<collection>/<documentId>`); changing it orphans live
    /// subscriptions.
    pub collection: String,
    /// URL suffix the host mounts the gateway endpoint at.
    pub endpoint_suffix: String,
}

impl GatewayConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            collection: "shared-states".to_string(),
            endpoint_suffix: "/shared-state".to_string(),
        }
    }

    /// Sets the backend collection name.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Sets the endpoint suffix.
    pub fn with_endpoint_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.endpoint_suffix = suffix.into();
        self
    }

    /// Full endpoint path under a host-provided base path.
    pub fn endpoint_path(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.endpoint_suffix)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.collection, "shared-states");
        assert_eq!(config.endpoint_path("/api"), "/api/shared-state");
        assert_eq!(config.endpoint_path("/api/"), "/api/shared-state");
    }

    #[test]
    fn config_builder() {
        let config = GatewayConfig::new()
            .with_collection("states")
            .with_endpoint_suffix("/state");
        assert_eq!(config.collection, "states");
        assert_eq!(config.endpoint_path(""), "/state");
    }
}
