//! Callable descriptors.
//!
//! A descriptor is the declaration-side view of a callable proposed for a
//! call. Types on a descriptor are written in terms of declaration-local
//! variable indices; a candidate's fresh-variables substitutor remaps them
//! into the candidate's own constraint system.

use mica_common::Atom;
use mica_solver::TypeId;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct CallableDescriptor {
    pub name: Atom,
    pub param_types: Vec<TypeId>,
    pub return_type: Option<TypeId>,
    /// True for the descriptor synthesized when overload selection fails.
    pub is_error: bool,
    /// Set on a synthetic SAM-adapter member; points at the adapted base
    /// callable.
    pub synthetic_sam_base: Option<Rc<CallableDescriptor>>,
    /// Whether the callable's last declared parameter is a vararg.
    pub has_trailing_vararg: bool,
}

impl CallableDescriptor {
    pub fn new(name: Atom, param_types: Vec<TypeId>, return_type: Option<TypeId>) -> Self {
        Self {
            name,
            param_types,
            return_type,
            is_error: false,
            synthetic_sam_base: None,
            has_trailing_vararg: false,
        }
    }

    /// The descriptor standing in for an unresolvable call.
    pub fn error_marker(name: Atom) -> Self {
        Self {
            name,
            param_types: Vec::new(),
            return_type: None,
            is_error: true,
            synthetic_sam_base: None,
            has_trailing_vararg: false,
        }
    }

    pub fn is_error_marker(&self) -> bool {
        self.is_error
    }
}
