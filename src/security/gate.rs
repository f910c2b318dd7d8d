//! The gate in front of protected routes.

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::HeaderMap;

use crate::components::Capability;
use crate::config::ProtectionConfig;
use crate::endpoint::Handler;
use crate::error::EndpointError;
use crate::routing::{RouteId, RouteTable};
use crate::security::validator::RequestSecurityValidator;

/// A validator bound to the set of routes it protects.
#[derive(Debug, Clone)]
pub struct SecurityGate {
    validator: Arc<dyn RequestSecurityValidator>,
    protected: HashSet<RouteId>,
}

impl SecurityGate {
    pub fn new(validator: Arc<dyn RequestSecurityValidator>, protected: HashSet<RouteId>) -> Self {
        Self { validator, protected }
    }

    pub fn is_protected(&self, route: RouteId) -> bool {
        self.protected.contains(&route)
    }

    pub fn protected_routes(&self) -> &HashSet<RouteId> {
        &self.protected
    }

    /// Let the request through unless the route is protected and the
    /// validator rejects it.
    pub fn authorize(&self, route: RouteId, headers: &HeaderMap) -> Result<(), EndpointError> {
        if !self.is_protected(route) {
            return Ok(());
        }
        self.validator.validate(headers).map_err(EndpointError::from)
    }
}

impl Capability<SecurityGate> {
    /// Without a gate every request is allowed.
    pub fn authorize(&self, route: RouteId, headers: &HeaderMap) -> Result<(), EndpointError> {
        match self {
            Capability::Enabled(gate) => gate.authorize(route, headers),
            Capability::Disabled => Ok(()),
        }
    }
}

/// Turn a protection policy into route ids.
///
/// Exempt handlers are never included. Returns the first endpoint name
/// that matches no route.
pub fn resolve_protected_routes(
    policy: &ProtectionConfig,
    routes: &RouteTable<Handler>,
) -> Result<HashSet<RouteId>, String> {
    match policy {
        ProtectionConfig::AllExceptExempt => Ok(routes
            .routes()
            .iter()
            .filter(|r| !r.handler.security_exempt())
            .map(|r| r.id)
            .collect()),
        ProtectionConfig::Endpoints { names } => {
            let mut protected = HashSet::new();
            for name in names {
                let matching: Vec<_> = routes
                    .routes()
                    .iter()
                    .filter(|r| r.handler.name() == name)
                    .collect();
                if matching.is_empty() {
                    return Err(name.clone());
                }
                for route in matching {
                    if route.handler.security_exempt() {
                        tracing::warn!(endpoint = %name, "Ignoring protection for security-exempt endpoint");
                        continue;
                    }
                    protected.insert(route.id);
                }
            }
            Ok(protected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::validator::{basic_auth_header_value, BasicAuthValidator};
    use axum::http::{header, HeaderValue};

    fn gate(protected: &[usize]) -> SecurityGate {
        SecurityGate::new(
            Arc::new(BasicAuthValidator::new("user", "pass")),
            protected.iter().map(|&i| RouteId(i)).collect(),
        )
    }

    #[test]
    fn test_unprotected_routes_pass_without_credentials() {
        assert!(gate(&[1]).authorize(RouteId(0), &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_protected_route_requires_credentials() {
        let gate = gate(&[1]);
        assert!(matches!(
            gate.authorize(RouteId(1), &HeaderMap::new()),
            Err(EndpointError::Api(_))
        ));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&basic_auth_header_value("user", "pass")).unwrap(),
        );
        assert!(gate.authorize(RouteId(1), &headers).is_ok());
    }

    #[test]
    fn test_disabled_gate_allows_everything() {
        let disabled: Capability<SecurityGate> = Capability::Disabled;
        assert!(disabled.authorize(RouteId(0), &HeaderMap::new()).is_ok());

        let enabled = Capability::Enabled(gate(&[0]));
        assert!(enabled.authorize(RouteId(0), &HeaderMap::new()).is_err());
    }
}
