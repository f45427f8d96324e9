//! Type identity tokens for binding keys.
//!
//! A [`TypeKey`] is either a reflected type, whose token is the address of a
//! static [`ReflectedTypeInfo`] provided by the host's type system, or a
//! native type, identified by [`std::any::TypeId`]. Keys compare by
//! discriminant and identity, never by name. Types opt in by implementing
//! [`TypeIdentity`], normally through one of the `declare_*_type!` macros.

use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};

/// Static description of a reflected type. One static per type.
#[derive(Debug)]
pub struct ReflectedTypeInfo {
    name: &'static str,
}

impl ReflectedTypeInfo {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[derive(Clone, Copy)]
pub struct ReflectedType(&'static ReflectedTypeInfo);

impl ReflectedType {
    pub const fn new(info: &'static ReflectedTypeInfo) -> Self {
        Self(info)
    }

    pub fn name(&self) -> &'static str {
        self.0.name
    }

    pub fn info(&self) -> &'static ReflectedTypeInfo {
        self.0
    }
}

impl PartialEq for ReflectedType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for ReflectedType {}

impl Hash for ReflectedType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.0, state);
    }
}

impl Debug for ReflectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReflectedType").field(&self.0.name).finish()
    }
}

#[derive(Clone, Copy)]
pub struct NativeType {
    id: std::any::TypeId,
    name: &'static str,
}

impl NativeType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: std::any::TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for NativeType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NativeType {}

impl Hash for NativeType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NativeType").field(&self.name).finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Reflected(ReflectedType),
    Native(NativeType),
}

impl TypeKey {
    pub fn of<T: TypeIdentity + ?Sized>() -> Self {
        T::type_key()
    }

    pub fn native<T: ?Sized + 'static>() -> Self {
        Self::Native(NativeType::of::<T>())
    }

    pub const fn reflected(info: &'static ReflectedTypeInfo) -> Self {
        Self::Reflected(ReflectedType::new(info))
    }

    /// Display name. Not unique, never used for comparison.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reflected(ty) => ty.name(),
            Self::Native(ty) => ty.name(),
        }
    }

    pub fn as_reflected(&self) -> Option<ReflectedType> {
        match self {
            Self::Reflected(ty) => Some(*ty),
            Self::Native(_) => None,
        }
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Types that can key a binding.
pub trait TypeIdentity: 'static {
    fn type_key() -> TypeKey;
}
