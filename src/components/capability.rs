//! Two-state holder for optional components.

/// An optional capability resolved at startup.
///
/// `Disabled` is a final answer ("this deployment does not have the
/// feature"), never "not initialized yet". Capabilities that act on every
/// request implement their per-request operation on `Capability<T>` itself,
/// so callers never branch on the state.
#[derive(Debug, Clone)]
pub enum Capability<T> {
    Enabled(T),
    Disabled,
}

impl<T> Capability<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(value) => Capability::Enabled(value),
            None => Capability::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Capability::Enabled(_))
    }

    pub fn enabled(&self) -> Option<&T> {
        match self {
            Capability::Enabled(value) => Some(value),
            Capability::Disabled => None,
        }
    }

    pub fn as_ref(&self) -> Capability<&T> {
        match self {
            Capability::Enabled(value) => Capability::Enabled(value),
            Capability::Disabled => Capability::Disabled,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Capability<U> {
        match self {
            Capability::Enabled(value) => Capability::Enabled(f(value)),
            Capability::Disabled => Capability::Disabled,
        }
    }

    /// Run `f` only when enabled.
    pub fn if_enabled(&self, f: impl FnOnce(&T)) {
        if let Capability::Enabled(value) = self {
            f(value);
        }
    }
}

impl<T> Default for Capability<T> {
    fn default() -> Self {
        Capability::Disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_option() {
        assert!(Capability::from_option(Some(1)).is_enabled());
        assert!(!Capability::<u8>::from_option(None).is_enabled());
    }

    #[test]
    fn test_map_and_enabled() {
        let cap = Capability::Enabled(2).map(|v| v * 10);
        assert_eq!(cap.enabled(), Some(&20));
        assert_eq!(Capability::<u8>::Disabled.map(|v| v + 1).enabled(), None);
    }

    #[test]
    fn test_if_enabled_skips_disabled() {
        let mut seen = 0;
        Capability::Enabled(5).if_enabled(|v| seen = *v);
        Capability::<i32>::Disabled.if_enabled(|_| seen = -1);
        assert_eq!(seen, 5);
    }
}
