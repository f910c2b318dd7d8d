//! The resolved set of optional components.

use crate::components::Capability;
use crate::observability::metrics::MetricsComponents;
use crate::registry::ServiceRegistryHooks;
use crate::security::SecurityGate;

/// One capability per optional feature, fixed at startup.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    pub metrics: Capability<MetricsComponents>,
    pub registry_hooks: Capability<ServiceRegistryHooks>,
    pub security: Capability<SecurityGate>,
}

impl ComponentRegistry {
    /// Stop background work owned by the components.
    pub fn shutdown(&self) {
        self.metrics.if_enabled(MetricsComponents::shutdown);
    }

    /// `(name, enabled)` for each capability, for startup logging.
    pub fn summary(&self) -> [(&'static str, bool); 3] {
        [
            ("metrics", self.metrics.is_enabled()),
            ("registry_hooks", self.registry_hooks.is_enabled()),
            ("security", self.security.is_enabled()),
        ]
    }
}
