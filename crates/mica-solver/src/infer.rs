//! The constraint store.
//!
//! A [`ConstraintSystem`] owns the inference variables of one resolution
//! candidate: their bound sets, fixation state, accumulated errors, and a
//! latched contradiction flag. Constraints are monotone — bounds are only
//! ever added — and fixation is one-way: once a variable is assigned a final
//! type it never changes.
//!
//! Variable identity is managed with an `ena` unification table so equality
//! constraints between two variables merge their bound sets instead of
//! duplicating them.

use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::intern::TypeInterner;
use crate::type_queries::is_subtype;
use crate::types::{TypeData, TypeId};
use ena::unify::{InPlaceUnificationTable, NoError, UnifyKey, UnifyValue};
use indexmap::IndexMap;
use mica_common::limits::{MAX_CONSTRAINT_DECOMPOSITION_DEPTH, MAX_SUBSTITUTION_PASSES};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::rc::Rc;
use tracing::{debug, trace};

/// An inference variable. Indices are local to one [`ConstraintSystem`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InferenceVar(pub u32);

impl UnifyKey for InferenceVar {
    type Value = InferenceInfo;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(index: u32) -> Self {
        InferenceVar(index)
    }

    fn tag() -> &'static str {
        "InferenceVar"
    }
}

/// Where a constraint came from. Carried on every bound so violations can be
/// attributed when they surface as diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConstraintPosition {
    /// The call's return type constrained by an expected type from context.
    ExpectedType,
    /// The call's return type constrained by an enclosing cast target.
    ExpectedTypeFromCast,
    /// An argument constrained against its parameter type.
    Argument(usize),
    /// A lambda body's returned expression constrained under the lambda's
    /// return slot.
    LambdaReturn,
    /// Declared bounds seeded at candidate creation.
    DeclaredUpperBound,
}

/// An error recorded on the constraint system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstraintError {
    /// A required subtype relation does not hold.
    SubtypeViolation {
        lower: TypeId,
        upper: TypeId,
        position: ConstraintPosition,
    },
    /// A variable's bounds admit no single solution.
    ContradictoryBounds {
        var: InferenceVar,
        first: TypeId,
        second: TypeId,
    },
    /// A variable reached full completion with no usable constraints.
    NotEnoughInformation { var: InferenceVar },
}

impl ConstraintError {
    /// Whether this error makes the owning system unsatisfiable.
    /// `NotEnoughInformation` is an inference failure, not a contradiction.
    fn is_contradiction(&self) -> bool {
        !matches!(self, ConstraintError::NotEnoughInformation { .. })
    }
}

/// Per-variable state: the fixed type (if any) and the accumulated bounds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InferenceInfo {
    pub resolved: Option<TypeId>,
    pub lower_bounds: SmallVec<[(TypeId, ConstraintPosition); 4]>,
    pub upper_bounds: SmallVec<[(TypeId, ConstraintPosition); 4]>,
    pub equal_bounds: SmallVec<[(TypeId, ConstraintPosition); 2]>,
}

impl UnifyValue for InferenceInfo {
    type Error = NoError;

    fn unify_values(a: &Self, b: &Self) -> Result<Self, NoError> {
        let mut merged = a.clone();
        merged.lower_bounds.extend(b.lower_bounds.iter().cloned());
        merged.upper_bounds.extend(b.upper_bounds.iter().cloned());
        merged.equal_bounds.extend(b.equal_bounds.iter().cloned());
        // Conflicting resolutions are rejected before keys are unioned, so
        // keeping the first here cannot lose information.
        merged.resolved = a.resolved.or(b.resolved);
        Ok(merged)
    }
}

/// Immutable snapshot of a constraint system, taken when a resolution result
/// is packaged. Later mutation of the live system does not affect it.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintStorage {
    /// Fixed variables in registration order.
    pub fixed: IndexMap<InferenceVar, TypeId>,
    /// Variables still unfixed at snapshot time, in registration order.
    pub not_fixed: Vec<InferenceVar>,
    pub errors: Vec<ConstraintError>,
    pub has_contradiction: bool,
}

/// The mutable constraint store of one resolution candidate.
pub struct ConstraintSystem {
    interner: Rc<TypeInterner>,
    table: InPlaceUnificationTable<InferenceVar>,
    /// Registration order, for deterministic iteration and fixation.
    registered: Vec<InferenceVar>,
    errors: Vec<ConstraintError>,
    contradiction: bool,
}

impl ConstraintSystem {
    pub fn new(interner: Rc<TypeInterner>) -> Self {
        Self {
            interner,
            table: InPlaceUnificationTable::new(),
            registered: Vec::new(),
            errors: Vec::new(),
            contradiction: false,
        }
    }

    pub fn interner(&self) -> &Rc<TypeInterner> {
        &self.interner
    }

    /// Register a fresh inference variable.
    pub fn fresh_type_variable(&mut self) -> InferenceVar {
        let var = self.table.new_key(InferenceInfo::default());
        self.registered.push(var);
        var
    }

    /// The interned type standing for `var`.
    pub fn variable_type(&self, var: InferenceVar) -> TypeId {
        self.interner.variable(var.0)
    }

    // =========================================================================
    // Constraint Addition
    // =========================================================================

    /// Require `lower` to be a subtype of `upper`.
    ///
    /// Constraints mentioning variables are recorded as bounds; function
    /// shapes are decomposed (parameters contravariant, return covariant);
    /// fully concrete constraints are checked eagerly and latch a
    /// contradiction on violation.
    pub fn add_subtype_constraint(
        &mut self,
        lower: TypeId,
        upper: TypeId,
        position: ConstraintPosition,
    ) {
        self.add_subtype_constraint_at_depth(lower, upper, position, 0);
    }

    fn add_subtype_constraint_at_depth(
        &mut self,
        lower: TypeId,
        upper: TypeId,
        position: ConstraintPosition,
        depth: usize,
    ) {
        if depth > MAX_CONSTRAINT_DECOMPOSITION_DEPTH || lower == upper {
            return;
        }
        let interner = Rc::clone(&self.interner);
        match (interner.lookup(lower), interner.lookup(upper)) {
            (Some(TypeData::Variable(a)), Some(TypeData::Variable(b))) => {
                self.push_upper_bound(InferenceVar(a), upper, position, depth);
                self.push_lower_bound(InferenceVar(b), lower, position, depth);
            }
            (Some(TypeData::Variable(a)), _) => {
                self.push_upper_bound(InferenceVar(a), upper, position, depth);
            }
            (_, Some(TypeData::Variable(b))) => {
                self.push_lower_bound(InferenceVar(b), lower, position, depth);
            }
            (Some(TypeData::Function(f)), Some(TypeData::Function(g)))
                if f.params.len() == g.params.len() =>
            {
                for (&fp, &gp) in f.params.iter().zip(g.params.iter()) {
                    self.add_subtype_constraint_at_depth(gp, fp, position, depth + 1);
                }
                self.add_subtype_constraint_at_depth(f.return_type, g.return_type, position, depth + 1);
            }
            _ => {
                if !is_subtype(&interner, lower, upper) {
                    self.record_error(ConstraintError::SubtypeViolation {
                        lower,
                        upper,
                        position,
                    });
                }
            }
        }
    }

    /// Require `a` and `b` to be equal, but only when the constraint cannot
    /// contradict: identical types, a variable on either side, or already
    /// compatible resolutions. Anything else is a silent no-op.
    pub fn add_equality_constraint_if_compatible(
        &mut self,
        a: TypeId,
        b: TypeId,
        position: ConstraintPosition,
    ) {
        if a == b {
            return;
        }
        let interner = Rc::clone(&self.interner);
        match (interner.lookup(a), interner.lookup(b)) {
            (Some(TypeData::Variable(x)), Some(TypeData::Variable(y))) => {
                let (vx, vy) = (InferenceVar(x), InferenceVar(y));
                match (self.probe(vx), self.probe(vy)) {
                    (Some(tx), Some(ty)) if tx != ty => {
                        trace!(?vx, ?vy, "equality constraint dropped: both fixed, incompatible");
                    }
                    _ => {
                        self.table.union(vx, vy);
                    }
                }
            }
            (Some(TypeData::Variable(x)), _) => self.push_equal_bound(InferenceVar(x), b, position),
            (_, Some(TypeData::Variable(y))) => self.push_equal_bound(InferenceVar(y), a, position),
            _ => {
                trace!(?a, ?b, "equality constraint dropped: distinct concrete types");
            }
        }
    }

    fn push_lower_bound(
        &mut self,
        var: InferenceVar,
        bound: TypeId,
        position: ConstraintPosition,
        depth: usize,
    ) {
        if let Some(fixed) = self.probe(var) {
            self.add_subtype_constraint_at_depth(bound, fixed, position, depth + 1);
            return;
        }
        let root = self.table.find(var);
        let mut info = InferenceInfo::default();
        info.lower_bounds.push((bound, position));
        self.table.union_value(root, info);
    }

    fn push_upper_bound(
        &mut self,
        var: InferenceVar,
        bound: TypeId,
        position: ConstraintPosition,
        depth: usize,
    ) {
        if let Some(fixed) = self.probe(var) {
            self.add_subtype_constraint_at_depth(fixed, bound, position, depth + 1);
            return;
        }
        let root = self.table.find(var);
        let mut info = InferenceInfo::default();
        info.upper_bounds.push((bound, position));
        self.table.union_value(root, info);
    }

    fn push_equal_bound(&mut self, var: InferenceVar, bound: TypeId, position: ConstraintPosition) {
        if self.probe(var).is_some() {
            // Fixed variables are past constraining; compatibility was the
            // caller's concern, not an error.
            return;
        }
        let root = self.table.find(var);
        let mut info = InferenceInfo::default();
        info.equal_bounds.push((bound, position));
        self.table.union_value(root, info);
    }

    // =========================================================================
    // Fixation and Queries
    // =========================================================================

    /// The fixed type of `var`, if any.
    pub fn probe(&mut self, var: InferenceVar) -> Option<TypeId> {
        self.table.probe_value(var).resolved
    }

    /// The current bound set of `var` (merged across its unification class).
    pub fn variable_constraints(&mut self, var: InferenceVar) -> InferenceInfo {
        self.table.probe_value(var)
    }

    /// Fix `var` to `ty`. Fixation is one-way; fixing an already-fixed
    /// variable is a caller bug.
    pub fn fix_variable(&mut self, var: InferenceVar, ty: TypeId) {
        let root = self.table.find(var);
        assert!(
            self.table.probe_value(root).resolved.is_none(),
            "invariant violation: type variable {var:?} fixed twice"
        );
        self.table.union_value(
            root,
            InferenceInfo {
                resolved: Some(ty),
                ..InferenceInfo::default()
            },
        );
        trace!(?var, ?ty, "fixed type variable");
    }

    /// Unfixed variables, one per unification class, in registration order.
    pub fn not_fixed_type_variables(&mut self) -> Vec<InferenceVar> {
        let registered = self.registered.clone();
        let mut seen = FxHashSet::default();
        let mut not_fixed = Vec::new();
        for var in registered {
            let root = self.table.find(var);
            if !seen.insert(root) {
                continue;
            }
            if self.table.probe_value(root).resolved.is_none() {
                not_fixed.push(root);
            }
        }
        not_fixed
    }

    /// Build a substitutor mapping every fixed variable to its type and every
    /// unified alias to its class representative.
    pub fn build_current_substitutor(&mut self) -> TypeSubstitution {
        let registered = self.registered.clone();
        let mut subst = TypeSubstitution::new();
        for var in registered {
            let root = self.table.find(var);
            if let Some(ty) = self.table.probe_value(root).resolved {
                subst.insert(var.0, ty);
            } else if root != var {
                subst.insert(var.0, self.interner.variable(root.0));
            }
        }
        subst
    }

    /// Resolve `ty` through the current substitutor, following chains of
    /// fixed variables to convergence.
    pub fn substitute(&mut self, ty: TypeId) -> TypeId {
        let subst = self.build_current_substitutor();
        let interner = Rc::clone(&self.interner);
        let mut current = ty;
        for _ in 0..MAX_SUBSTITUTION_PASSES {
            let next = instantiate_type(&interner, current, &subst);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    // =========================================================================
    // Errors and Snapshots
    // =========================================================================

    pub fn record_error(&mut self, error: ConstraintError) {
        debug!(?error, "constraint error");
        if error.is_contradiction() {
            self.contradiction = true;
        }
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[ConstraintError] {
        &self.errors
    }

    pub fn has_contradiction(&self) -> bool {
        self.contradiction
    }

    /// Take an immutable snapshot of the current storage.
    pub fn as_read_only_storage(&mut self) -> ConstraintStorage {
        let registered = self.registered.clone();
        let mut fixed = IndexMap::new();
        let mut not_fixed = Vec::new();
        let mut seen = FxHashSet::default();
        for var in registered {
            let root = self.table.find(var);
            if !seen.insert(root) {
                continue;
            }
            match self.table.probe_value(root).resolved {
                Some(ty) => {
                    fixed.insert(root, ty);
                }
                None => not_fixed.push(root),
            }
        }
        ConstraintStorage {
            fixed,
            not_fixed,
            errors: self.errors.clone(),
            has_contradiction: self.contradiction,
        }
    }
}
