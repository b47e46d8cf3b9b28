//! Typed service registry.
//!
//! Startup code registers shared collaborators (serializer, HTTP client,
//! GraphQL client factory) here; layout handler factories resolve them when
//! a handler is first used. One value per type. After
//! [`RenderingEngineBuilder::build`](crate::RenderingEngineBuilder::build)
//! the registry is frozen behind an `Arc` and only read.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};

#[derive(Default)]
pub struct Services {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    pub fn new() -> Self { Self::default() }

    /// Registers `value` under its own type, replacing any earlier value.
    ///
    /// Trait objects are registered as their `Arc`:
    /// `services.register::<Arc<dyn LayoutSerializer>>(Arc::new(JsonLayoutSerializer))`.
    pub fn register<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.entries.insert(TypeId::of::<T>(), Arc::new(value));
        self
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Returns a clone of the registered `T`.
    pub fn resolve<T: Clone + Send + Sync + 'static>(&self) -> Result<T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
            .ok_or(Error::MissingService(type_name::<T>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct Hello;

    impl Greeter for Hello {
        fn greet(&self) -> &'static str { "hello" }
    }

    #[test]
    fn resolves_registered_trait_objects() {
        let mut services = Services::new();
        services.register::<Arc<dyn Greeter>>(Arc::new(Hello));

        assert!(services.contains::<Arc<dyn Greeter>>());
        let greeter = services.resolve::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn missing_service_names_the_type() {
        let services = Services::new();
        match services.resolve::<String>() {
            Err(Error::MissingService(name)) => assert!(name.contains("String")),
            other => panic!("expected MissingService, got {other:?}"),
        }
    }

    #[test]
    fn registering_twice_keeps_one_entry() {
        let mut services = Services::new();
        services.register(1_u32).register(2_u32);
        assert_eq!(services.entries.len(), 1);
        assert_eq!(services.resolve::<u32>().unwrap(), 2);
    }
}
