//! Concurrent method-name to handler mapping.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::r#async::MethodHandler;

/// Registry of method handlers, shared between the host and the dispatcher.
///
/// Lookups take a read lock and never block each other; registration and
/// removal take the write lock. Handlers are cloned out of the map, so no
/// lock is held while a handler runs.
#[derive(Default)]
pub struct MethodRegistry {
    methods: RwLock<HashMap<String, Arc<dyn MethodHandler>>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous handler.
    pub fn register<H>(&self, name: impl Into<String>, handler: H)
    where
        H: MethodHandler + 'static,
    {
        self.register_shared(name, Arc::new(handler));
    }

    /// Register an already shared handler, e.g. one object serving several
    /// method names.
    pub fn register_shared(&self, name: impl Into<String>, handler: Arc<dyn MethodHandler>) {
        let name = name.into();
        let replaced = self.methods.write().insert(name.clone(), handler).is_some();
        tracing::debug!(method = %name, replaced, "registered method");
    }

    /// Remove the handler for `name`; a no-op when none is registered.
    pub fn unregister(&self, name: &str) {
        if self.methods.write().remove(name).is_some() {
            tracing::debug!(method = %name, "unregistered method");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn MethodHandler>> {
        self.methods.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.methods.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.read().is_empty()
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.method_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MethodError, Params, RequestContext, RequestId, ResultWriter};
    use async_trait::async_trait;
    use std::sync::Barrier;
    use std::thread;
    use tokio_util::sync::CancellationToken;

    struct Constant(&'static str);

    #[async_trait]
    impl MethodHandler for Constant {
        async fn handle(
            &self,
            _ctx: &RequestContext,
            _params: &Params,
            result: &mut ResultWriter,
        ) -> Result<(), MethodError> {
            result.write_json(self.0)?;
            Ok(())
        }
    }

    async fn call(registry: &MethodRegistry, name: &str) -> Option<Vec<u8>> {
        let handler = registry.lookup(name)?;
        let ctx = RequestContext::new(RequestId::Number(1), name, CancellationToken::new());
        let mut result = ResultWriter::new();
        handler.handle(&ctx, &Params::absent(), &mut result).await.ok()?;
        Some(result.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let registry = MethodRegistry::new();
        registry.register("greet", Constant("first"));
        registry.register("greet", Constant("second"));

        assert_eq!(registry.len(), 1);
        assert_eq!(call(&registry, "greet").await.unwrap(), br#""second""#);
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let registry = MethodRegistry::new();
        registry.register("keep", Constant("x"));
        registry.unregister("missing");
        registry.unregister("missing");

        assert!(registry.contains("keep"));
        assert_eq!(registry.method_names(), vec!["keep".to_string()]);
    }

    #[test]
    fn test_unregister_removes() {
        let registry = MethodRegistry::new();
        registry.register("gone", Constant("x"));
        registry.unregister("gone");

        assert!(registry.lookup("gone").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_shared_handler_under_several_names() {
        let registry = MethodRegistry::new();
        let handler: Arc<dyn MethodHandler> = Arc::new(Constant("same"));
        registry.register_shared("a", Arc::clone(&handler));
        registry.register_shared("b", handler);

        assert_eq!(registry.method_names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let registry = Arc::new(MethodRegistry::new());
        registry.register("stable", Constant("x"));

        let readers = 8;
        let barrier = Arc::new(Barrier::new(readers + 1));
        let mut handles = Vec::new();

        for _ in 0..readers {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                // Keep looking until the writer's registration shows up
                loop {
                    assert!(registry.lookup("stable").is_some());
                    if registry.lookup("late").is_some() {
                        break;
                    }
                    thread::yield_now();
                }
            }));
        }

        barrier.wait();
        registry.register("late", Constant("y"));

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_readers_do_not_block_each_other() {
        let registry = MethodRegistry::new();
        registry.register("m", Constant("x"));

        // Two simultaneous read guards from the same lock
        let first = registry.methods.read();
        let second = registry.methods.try_read();
        assert!(second.is_some());
        assert!(first.contains_key("m"));
    }
}
