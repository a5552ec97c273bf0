//! Extensions
//!
//! An [`ExtensionPoint`] holds ordered pre and post hooks around one
//! operation. Pre hooks observe the input before the operation runs; post
//! hooks observe the input and the result and return the (possibly
//! replaced) result. Hooks run in registration order.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Named, versioned hook
pub struct Extension<F: ?Sized> {
    /// Extension name
    pub name: String,
    /// Semantic version
    pub version: String,
    /// Hook body
    pub loader: Arc<F>,
}

impl<F: ?Sized> Clone for Extension<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            version: self.version.clone(),
            loader: Arc::clone(&self.loader),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Extension<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Extension(name={}, version={})", self.name, self.version)
    }
}

/// Hook called before an operation
pub type PreHook<I> = dyn Fn(&I) + Send + Sync;

/// Hook called after an operation; returns the result to keep
pub type PostHook<I, O> = dyn Fn(&I, O) -> O + Send + Sync;

/// Ordered pre and post hooks of one operation
pub struct ExtensionPoint<I: ?Sized, O> {
    pre: RwLock<Vec<Extension<PreHook<I>>>>,
    post: RwLock<Vec<Extension<PostHook<I, O>>>>,
}

impl<I: ?Sized, O> Default for ExtensionPoint<I, O> {
    fn default() -> Self {
        Self {
            pre: RwLock::new(Vec::new()),
            post: RwLock::new(Vec::new()),
        }
    }
}

impl<I: ?Sized, O> fmt::Debug for ExtensionPoint<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionPoint")
            .field("pre", &*self.pre.read())
            .field("post", &*self.post.read())
            .finish()
    }
}

impl<I: ?Sized, O> ExtensionPoint<I, O> {
    /// Create an empty extension point
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pre hook
    pub fn register_pre<F>(&self, name: &str, version: &str, hook: F)
    where
        F: Fn(&I) + Send + Sync + 'static,
    {
        self.pre.write().push(Extension {
            name: name.to_string(),
            version: version.to_string(),
            loader: Arc::new(hook),
        });
    }

    /// Append a post hook
    pub fn register_post<F>(&self, name: &str, version: &str, hook: F)
    where
        F: Fn(&I, O) -> O + Send + Sync + 'static,
    {
        self.post.write().push(Extension {
            name: name.to_string(),
            version: version.to_string(),
            loader: Arc::new(hook),
        });
    }

    /// Registered pre and post hooks
    pub fn extensions(&self) -> (Vec<Extension<PreHook<I>>>, Vec<Extension<PostHook<I, O>>>) {
        (self.pre.read().clone(), self.post.read().clone())
    }

    /// Whether any hook is registered
    pub fn is_empty(&self) -> bool {
        self.pre.read().is_empty() && self.post.read().is_empty()
    }

    /// Run every pre hook
    pub fn run_pre(&self, input: &I) {
        // Snapshot so hooks may register further hooks
        let hooks = self.pre.read().clone();
        for hook in hooks {
            (hook.loader)(input);
        }
    }

    /// Run every post hook, threading the result through
    pub fn run_post(&self, input: &I, output: O) -> O {
        let hooks = self.post.read().clone();
        hooks
            .into_iter()
            .fold(output, |acc, hook| (hook.loader)(input, acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_hooks_run_in_order() {
        let point: ExtensionPoint<i64, Vec<String>> = ExtensionPoint::new();
        point.register_post("first", "1.0.0", |input, mut out| {
            out.push(format!("first:{input}"));
            out
        });
        point.register_post("second", "1.0.0", |_, mut out| {
            out.push("second".into());
            out
        });

        let out = point.run_post(&7, Vec::new());
        assert_eq!(out, vec!["first:7".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_pre_hooks_observe_input() {
        let calls = Arc::new(AtomicUsize::new(0));
        let point: ExtensionPoint<str, ()> = ExtensionPoint::new();
        let seen = Arc::clone(&calls);
        point.register_pre("count", "0.1.0", move |input: &str| {
            seen.fetch_add(input.len(), Ordering::SeqCst);
        });

        point.run_pre("abc");
        point.run_pre("de");
        assert_eq!(calls.load(Ordering::SeqCst), 5);

        let (pre, post) = point.extensions();
        assert_eq!(pre.len(), 1);
        assert!(post.is_empty());
        assert_eq!(format!("{:?}", pre[0]), "Extension(name=count, version=0.1.0)");
    }
}
