//! Header capability injected at construction

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use tracing::error;

/// Supplies the line written at the top of a fresh log file.
///
/// Asked at most once per write that finds the file empty. Returning `None`
/// or an empty string skips the header for that write.
pub trait HeaderProvider: Send + Sync + 'static {
    /// Header text, without a trailing newline
    fn header(&self) -> Option<String>;
}

impl<F> HeaderProvider for F
where
    F: Fn() -> Option<String> + Send + Sync + 'static,
{
    fn header(&self) -> Option<String> {
        self()
    }
}

/// How the logger holds on to its header provider
#[derive(Clone)]
pub enum HeaderSource {
    /// The logger keeps the provider alive
    Shared(Arc<dyn HeaderProvider>),
    /// The provider is owned elsewhere; once dropped it counts as absent
    Weak(Weak<dyn HeaderProvider>),
}

impl HeaderSource {
    /// Hold the provider by ownership
    pub fn shared<P: HeaderProvider>(provider: P) -> Self {
        Self::Shared(Arc::new(provider))
    }

    /// Hold the provider without keeping it alive
    pub fn weak<P: HeaderProvider>(provider: &Arc<P>) -> Self {
        let weak: Weak<P> = Arc::downgrade(provider);
        Self::Weak(weak)
    }

    /// Ask for the header text, if the provider is still around and has one.
    ///
    /// A provider that panics is treated as having no header.
    pub(crate) fn resolve(&self) -> Option<String> {
        let provider = match self {
            Self::Shared(provider) => Arc::clone(provider),
            Self::Weak(weak) => weak.upgrade()?,
        };

        match catch_unwind(AssertUnwindSafe(|| provider.header())) {
            Ok(header) => header.filter(|h| !h.is_empty()),
            Err(_) => {
                error!("log header provider panicked, writing entry without header");
                None
            }
        }
    }
}

impl fmt::Debug for HeaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared(_) => f.write_str("HeaderSource::Shared"),
            Self::Weak(weak) => write!(
                f,
                "HeaderSource::Weak {{ alive: {} }}",
                weak.strong_count() > 0
            ),
        }
    }
}
