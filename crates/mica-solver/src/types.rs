//! Structural type representation.
//!
//! Types are interned: a `TypeId` is an index into the owning
//! [`TypeInterner`](crate::TypeInterner), and structural equality of two types
//! is `TypeId` equality. The representation is deliberately small — the
//! resolution engine only distinguishes intrinsics, inference variables,
//! function shapes, and named (nominal) types.

use mica_common::Atom;
use smallvec::SmallVec;

/// An interned type, represented as an index into the owning interner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The error type. Compatible in both directions so one failure does not
    /// cascade into follow-up diagnostics.
    pub const ERROR: TypeId = TypeId(0);
    /// The bottom type; subtype of everything.
    pub const NOTHING: TypeId = TypeId(1);
    /// The unit type; the result of calls in statement position.
    pub const UNIT: TypeId = TypeId(2);
    pub const BOOL: TypeId = TypeId(3);
    pub const INT: TypeId = TypeId(4);
    pub const STRING: TypeId = TypeId(5);
    /// The top type; supertype of everything.
    pub const ANY: TypeId = TypeId(6);
}

/// Built-in types with fixed, pre-registered `TypeId`s.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    Error,
    Nothing,
    Unit,
    Bool,
    Int,
    String,
    Any,
}

/// The shape of a function type: parameter types and a return type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionShape {
    pub params: SmallVec<[TypeId; 4]>,
    pub return_type: TypeId,
}

/// Structural type data behind a `TypeId`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Intrinsic(Intrinsic),
    /// An inference variable of some candidate's constraint system. The index
    /// is only meaningful relative to that system.
    Variable(u32),
    Function(FunctionShape),
    /// A nominal class/interface type, identified by name.
    Named(Atom),
}
