//! Opaque correlation context carried by loggers

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value bound to a logger for correlation.
///
/// The facade never interprets it; backends and callers may downcast it.
#[derive(Clone, Default)]
pub struct Context {
    value: Option<Arc<dyn Any + Send + Sync>>,
}

impl Context {
    /// The empty context every logger starts with
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Some(Arc::new(value)),
        }
    }

    #[must_use]
    pub fn is_background(&self) -> bool {
        self.value.is_none()
    }

    pub fn value<T: Any>(&self) -> Option<&T> {
        self.value.as_deref().and_then(|v| v.downcast_ref::<T>())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_background() {
            f.write_str("Context(background)")
        } else {
            f.write_str("Context(..)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background() {
        let ctx = Context::background();
        assert!(ctx.is_background());
        assert!(ctx.value::<String>().is_none());
    }

    #[test]
    fn test_downcast() {
        let ctx = Context::new(String::from("trace-123"));
        assert!(!ctx.is_background());
        assert_eq!(ctx.value::<String>().map(String::as_str), Some("trace-123"));
        assert!(ctx.value::<u32>().is_none());
    }
}
