//! Shared model handles.
//!
//! The embedding model and the speech-to-text engine are set up once when the
//! pipeline is constructed and handed to the stages that need them. A handle that
//! failed to initialize stays `Unavailable` and is checked before every use.

use std::sync::Arc;

/// A shared component that is either ready for use or unavailable.
#[derive(Debug)]
pub enum Component<T: ?Sized> {
    Ready(Arc<T>),
    Unavailable(String),
}

impl<T: ?Sized> Clone for Component<T> {
    fn clone(&self) -> Self {
        match self {
            Component::Ready(inner) => Component::Ready(Arc::clone(inner)),
            Component::Unavailable(reason) => Component::Unavailable(reason.clone()),
        }
    }
}

impl<T: ?Sized> Component<T> {
    /// Wrap an initialized component.
    pub fn ready(inner: Arc<T>) -> Self {
        Component::Ready(inner)
    }

    /// Record why a component could not be initialized.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Component::Unavailable(reason.into())
    }

    /// Borrow the component or return the reason it is missing.
    pub fn get(&self) -> std::result::Result<&Arc<T>, &str> {
        match self {
            Component::Ready(inner) => Ok(inner),
            Component::Unavailable(reason) => Err(reason),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Component::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_and_unavailable() {
        let ready: Component<str> = Component::ready(Arc::from("model"));
        assert!(ready.is_ready());
        assert_eq!(&**ready.get().unwrap(), "model");

        let missing: Component<str> = Component::unavailable("HF_TOKEN not set");
        assert!(!missing.is_ready());
        assert_eq!(missing.get().unwrap_err(), "HF_TOKEN not set");
    }
}
