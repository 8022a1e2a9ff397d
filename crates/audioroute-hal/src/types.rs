//! Type-safe wrappers for module-assigned object ids.
//!
//! The device module numbers ports, port configurations and patches out
//! of a single `i32` space. These wrappers keep the three kinds apart at
//! compile time (e.g. passing a port id where a patch id is expected does
//! not build), and keep all of them apart from the framework's own handle
//! space, which lives on the manager side.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Raw module-assigned id type.
pub type RawId = i32;

/// Marker trait for module object kinds.
pub trait ObjectKind: Send + Sync + 'static {
    /// Returns the object kind name for debugging.
    fn kind_name() -> &'static str;
}

/// A type-safe module object id.
///
/// The phantom type parameter `T` indicates what kind of module object
/// this id refers to. Ids are minted by the module during negotiation;
/// the manager never invents them.
pub struct ObjectId<T: ObjectKind> {
    raw: RawId,
    _marker: PhantomData<T>,
}

impl<T: ObjectKind> ObjectId<T> {
    /// Creates an id from a raw module-reported value.
    pub const fn from_raw(raw: RawId) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the raw id value.
    pub const fn as_raw(&self) -> RawId {
        self.raw
    }
}

impl<T: ObjectKind> Clone for ObjectId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ObjectKind> Copy for ObjectId<T> {}

impl<T: ObjectKind> fmt::Debug for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", T::kind_name(), self.raw)
    }
}

impl<T: ObjectKind> fmt::Display for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<T: ObjectKind> PartialEq for ObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: ObjectKind> Eq for ObjectId<T> {}

impl<T: ObjectKind> PartialOrd for ObjectId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ObjectKind> Ord for ObjectId<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T: ObjectKind> Hash for ObjectId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

// Ids travel as their raw value; the kind is carried by position in the
// enclosing message.
impl<T: ObjectKind> Serialize for ObjectId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de, T: ObjectKind> Deserialize<'de> for ObjectId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(Self::from_raw)
    }
}

macro_rules! define_id_kind {
    ($name:ident, $kind_name:literal, $id_alias:ident) => {
        /// Marker type for module $kind_name objects.
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl ObjectKind for $name {
            fn kind_name() -> &'static str {
                $kind_name
            }
        }

        /// Type alias for $kind_name ids.
        pub type $id_alias = ObjectId<$name>;
    };
}

define_id_kind!(PortKind, "Port", PortId);
define_id_kind!(PortConfigKind, "PortConfig", PortConfigId);
define_id_kind!(PatchKind, "Patch", PatchId);

/// Caller-chosen handle identifying an open or opening stream.
///
/// Mix port configurations are tagged with the handle of the stream they
/// belong to; the value is opaque to the module.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IoHandle(pub i32);

impl IoHandle {
    /// The handle used for transient configurations that belong to no
    /// stream (e.g. buffer-size probing).
    pub const NONE: Self = IoHandle(0);
}

impl fmt::Display for IoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
