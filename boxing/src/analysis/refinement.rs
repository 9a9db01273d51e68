//! Refinement resolution
//!
//! Finds the *topmost refined declaration* of a declaration: the original
//! member, in the most general supertype, that it ultimately overrides. The
//! boxing decision is always made on the topmost declaration so that every
//! override of a member agrees on its representation.
//!
//! Besides following refinement pointers, resolution understands three kinds
//! of aliasing:
//! - parameters of alias and `actual` member classes stand for the parameters
//!   at the same position in the class they extend
//! - parameters of a method (or of a generated functional parameter) stand for
//!   the positionally corresponding parameters of the method it refines
//! - a function literal specified for an inherited method (`m = (x) => ...;`)
//!   stands for that method while the specification is being analyzed
//!
//! Resolution never fails: any shape it cannot classify resolves to the
//! declaration itself.

use super::policy::RepresentationPolicy;
use crate::model::id_types::collections::new_id_set;
use crate::model::{Container, DeclId, DeclKind, Declaration, IdSet, InternedString, Program};
use log::{trace, warn};
use std::collections::VecDeque;

/// Default bound on the length of a refinement chain
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Scoped substitutions from function literals to the methods they specify
///
/// Entries are pushed when the analyzer enters `m = (x) => ...;` and popped
/// when it leaves, so a substitution is only visible inside its statement.
#[derive(Debug, Default, Clone)]
pub struct ShortcutRewrites {
    entries: Vec<(DeclId, DeclId)>,
}

impl ShortcutRewrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, literal: DeclId, method: DeclId) {
        self.entries.push((literal, method));
    }

    pub fn pop(&mut self) -> Option<(DeclId, DeclId)> {
        self.entries.pop()
    }

    /// Innermost substitution for `literal`
    pub fn lookup(&self, literal: DeclId) -> Option<DeclId> {
        self.entries
            .iter()
            .rev()
            .find(|(l, _)| *l == literal)
            .map(|(_, m)| *m)
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of one resolution rule
enum Step {
    /// Final answer
    Done(DeclId),
    /// Continue with the general refinement rule on this declaration
    Continue(DeclId),
    /// Cycle or depth limit; give up on the whole chain
    Abort,
}

pub struct RefinementResolver<'a> {
    program: &'a Program,
    policy: &'a dyn RepresentationPolicy,
    max_depth: usize,
}

impl<'a> RefinementResolver<'a> {
    pub fn new(program: &'a Program, policy: &'a dyn RepresentationPolicy) -> Self {
        Self {
            program,
            policy,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Topmost refined declaration of `decl`
    pub fn topmost_refined(&self, decl: DeclId, rewrites: &ShortcutRewrites) -> DeclId {
        let mut path = new_id_set();
        match self.resolve(decl, rewrites, &mut path) {
            Some(topmost) => topmost,
            None => {
                warn!(
                    "refinement chain of '{}' is cyclic or too deep; treating it as topmost",
                    self.program.name_of(decl)
                );
                decl
            }
        }
    }

    pub fn is_topmost(&self, decl: DeclId, rewrites: &ShortcutRewrites) -> bool {
        self.topmost_refined(decl, rewrites) == decl
    }

    /// `path` holds the declarations currently being resolved; `None` means a
    /// declaration was re-entered or the chain exceeded the depth limit.
    fn resolve(
        &self,
        decl: DeclId,
        rewrites: &ShortcutRewrites,
        path: &mut IdSet<DeclId>,
    ) -> Option<DeclId> {
        if path.len() >= self.max_depth || !path.insert(decl) {
            return None;
        }
        let result = self.apply_rules(decl, rewrites, path);
        path.remove(&decl);
        result
    }

    fn apply_rules(
        &self,
        decl: DeclId,
        rewrites: &ShortcutRewrites,
        path: &mut IdSet<DeclId>,
    ) -> Option<DeclId> {
        let Some(declaration) = self.program.declarations.get(decl) else {
            return Some(decl);
        };

        let step = if let Some(class) = self.owning_class(declaration) {
            self.class_parameter(declaration, class, rewrites, path)
        } else if self.is_method_parameter(declaration) {
            self.method_parameter(declaration, rewrites, path)
        } else if let Some(method) = self.shortcut_substitution(declaration, rewrites) {
            trace!(
                "function literal stands for '{}'",
                self.program.name_of(method)
            );
            Step::Continue(method)
        } else {
            Step::Continue(decl)
        };

        match step {
            Step::Done(result) => Some(result),
            Step::Abort => None,
            Step::Continue(current) => {
                let refined = self
                    .program
                    .declarations
                    .get(current)
                    .and_then(|d| d.refined)
                    .filter(|&r| r != current);
                match refined {
                    Some(refined) => self.resolve(refined, rewrites, path),
                    None => Some(current),
                }
            }
        }
    }

    /// Class directly owning a value or functional parameter
    fn owning_class(&self, decl: &Declaration) -> Option<DeclId> {
        if !(decl.is_value() || decl.is_method()) || !decl.is_parameter() {
            return None;
        }
        let Container::Declaration(owner) = decl.container else {
            return None;
        };
        self.program
            .declarations
            .get(owner)
            .filter(|d| d.is_class())
            .map(|d| d.id)
    }

    /// Parameter of a method, of a specification scope, or of a functional
    /// parameter that is compiled to a method
    fn is_method_parameter(&self, decl: &Declaration) -> bool {
        if !(decl.is_value() || decl.is_method()) || !decl.is_parameter() {
            return false;
        }
        match decl.container {
            Container::Specification(_) => true,
            Container::Declaration(owner) => match self.program.declarations.get(owner) {
                Some(method) if method.is_method() => {
                    !method.is_parameter() || self.policy.creates_method(self.program, owner)
                }
                _ => false,
            },
            Container::Unit | Container::Block(_) => false,
        }
    }

    fn class_parameter(
        &self,
        decl: &Declaration,
        class: DeclId,
        rewrites: &ShortcutRewrites,
        path: &mut IdSet<DeclId>,
    ) -> Step {
        let Some(owner) = self.program.declarations.get(class) else {
            return Step::Done(decl.id);
        };
        let mut current_class = class;
        let mut parameter = decl.id;

        if owner.is_alias() || owner.is_actual() {
            let Some(index) = owner
                .parameter_lists()
                .first()
                .and_then(|list| list.iter().position(|&p| p == decl.id))
            else {
                return Step::Done(decl.id);
            };
            // Aliases are followed to the end first, then actual member classes
            if owner.is_alias() {
                match self.walk_extended(current_class, Declaration::is_alias) {
                    Some(next) => current_class = next,
                    None => return Step::Done(decl.id),
                }
            }
            if owner.is_actual() {
                match self.walk_extended(current_class, Declaration::is_actual) {
                    Some(next) => current_class = next,
                    None => return Step::Done(decl.id),
                }
            }
            let counterpart = self
                .program
                .declarations
                .get(current_class)
                .and_then(|c| c.parameter_lists().first())
                .and_then(|list| list.get(index))
                .copied();
            match counterpart {
                Some(p) => parameter = p,
                None => return Step::Done(decl.id),
            }
        }

        let Some(parameter_decl) = self.program.declarations.get(parameter) else {
            return Step::Done(decl.id);
        };
        if parameter_decl.is_shared() {
            if let Some(refined) = self.refined_member(current_class, parameter_decl) {
                if refined != parameter {
                    return match self.resolve(refined, rewrites, path) {
                        Some(topmost) => Step::Done(topmost),
                        None => Step::Abort,
                    };
                }
            }
        }
        Step::Done(parameter)
    }

    /// Follow extended-class links while `keep_going` holds
    fn walk_extended(&self, start: DeclId, keep_going: fn(&Declaration) -> bool) -> Option<DeclId> {
        let mut current = start;
        let mut seen = new_id_set();
        loop {
            let class = self.program.declarations.get(current)?;
            if !keep_going(class) {
                return Some(current);
            }
            if !seen.insert(current) {
                return None;
            }
            current = self.program.extended_class(current)?;
        }
    }

    fn method_parameter(
        &self,
        decl: &Declaration,
        rewrites: &ShortcutRewrites,
        path: &mut IdSet<DeclId>,
    ) -> Step {
        let Some(function) = decl.container.declaration() else {
            return Step::Done(decl.id);
        };
        let Some(refined_function) = self.resolve(function, rewrites, path) else {
            return Step::Abort;
        };
        if refined_function == function {
            return Step::Done(decl.id);
        }
        let (Some(func), Some(refined)) = (
            self.program.declarations.get(function),
            self.program.declarations.get(refined_function),
        ) else {
            return Step::Done(decl.id);
        };
        if !refined.is_functional() {
            return Step::Done(decl.id);
        }
        let lists = func.parameter_lists();
        let refined_lists = refined.parameter_lists();
        if lists.len() != refined_lists.len() {
            return Step::Done(decl.id);
        }
        for (list, refined_list) in lists.iter().zip(refined_lists) {
            if list.len() != refined_list.len() {
                return Step::Done(decl.id);
            }
            if let Some(index) = list.iter().position(|&p| p == decl.id) {
                return match self.resolve(refined_list[index], rewrites, path) {
                    Some(topmost) => Step::Done(topmost),
                    None => Step::Abort,
                };
            }
        }
        Step::Continue(decl.id)
    }

    /// Method a function literal stands for inside `m = (x) => ...;`
    fn shortcut_substitution(&self, decl: &Declaration, rewrites: &ShortcutRewrites) -> Option<DeclId> {
        if rewrites.is_empty() || !decl.is_method() {
            return None;
        }
        if decl.refined.is_some_and(|r| r != decl.id) {
            return None;
        }
        let Container::Specification(specified) = decl.container else {
            return None;
        };
        let specified = self.program.declarations.get(specified)?;
        if !specified.is_method() || !specified.is_shortcut_refinement() {
            return None;
        }
        rewrites.lookup(decl.id)
    }

    /// The non-`actual` shared member of `class` or its supertypes that a
    /// member named like `member` with the same signature refines
    ///
    /// Supertypes are searched breadth first, extended class before satisfied
    /// interfaces; the class's own members are considered last.
    pub fn refined_member(&self, class: DeclId, member: &Declaration) -> Option<DeclId> {
        let name = member.name?;
        let mut queue: VecDeque<DeclId> = self.supertypes(class).into();
        let mut seen = new_id_set();
        seen.insert(class);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(found) = self.matching_member(current, name, member) {
                return Some(found);
            }
            queue.extend(self.supertypes(current));
        }
        self.matching_member(class, name, member)
    }

    fn supertypes(&self, decl: DeclId) -> Vec<DeclId> {
        let Some(declaration) = self.program.declarations.get(decl) else {
            return Vec::new();
        };
        declaration
            .extended_type()
            .into_iter()
            .chain(declaration.satisfied_types().iter().copied())
            .filter_map(|ty| self.program.types.get(ty)?.declaration())
            .filter(|&d| self.program.declarations.get(d).is_some_and(Declaration::is_class_or_interface))
            .collect()
    }

    fn matching_member(
        &self,
        container: DeclId,
        name: InternedString,
        member: &Declaration,
    ) -> Option<DeclId> {
        let container = self.program.declarations.get(container)?;
        container.members().iter().copied().find(|&candidate| {
            self.program.declarations.get(candidate).is_some_and(|c| {
                c.name == Some(name)
                    && c.is_shared()
                    && !c.is_actual()
                    && same_signature(c, member)
            })
        })
    }
}

/// Member kind and parameter-list shape agree
fn same_signature(a: &Declaration, b: &Declaration) -> bool {
    let kind_matches = matches!(
        (&a.kind, &b.kind),
        (DeclKind::Value, DeclKind::Value)
            | (DeclKind::Value, DeclKind::Setter { .. })
            | (DeclKind::Setter { .. }, DeclKind::Value)
            | (DeclKind::Setter { .. }, DeclKind::Setter { .. })
            | (DeclKind::Method(_), DeclKind::Method(_))
            | (DeclKind::Class(_), DeclKind::Class(_))
    );
    kind_matches
        && a.parameter_lists().len() == b.parameter_lists().len()
        && a
            .parameter_lists()
            .iter()
            .zip(b.parameter_lists())
            .all(|(x, y)| x.len() == y.len())
}
