use std::fmt::{self, Display};
use std::sync::Arc;

use crate::host::ReferenceCollector;
use crate::type_id::{TypeIdentity, TypeKey};

/// The key of a binding: a type and an optional name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BindingId {
    type_key: TypeKey,
    name: Option<Arc<str>>,
}

impl BindingId {
    /// An empty name is the same as no name.
    pub fn new(type_key: TypeKey, name: Option<&str>) -> Self {
        Self {
            type_key,
            name: name.filter(|name| !name.is_empty()).map(Arc::from),
        }
    }

    pub fn of<T: TypeIdentity + ?Sized>() -> Self {
        Self::new(T::type_key(), None)
    }

    pub fn named<T: TypeIdentity + ?Sized>(name: &str) -> Self {
        Self::new(T::type_key(), Some(name))
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn trace(&self, collector: &mut dyn ReferenceCollector) {
        if let Some(ty) = self.type_key.as_reflected() {
            collector.add_referenced_type(ty);
        }
    }
}

impl Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}({name})", self.type_key),
            None => write!(f, "{}", self.type_key),
        }
    }
}
