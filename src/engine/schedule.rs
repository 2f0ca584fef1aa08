// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Jigsaw ordering.
//!
//! Two relations are derived from the wiring of an initialized analysis:
//!
//! - ordering edges ([`dependency_jigsaws`]): a jigsaw depends on the jigsaw
//!   producing its parent state and, unless it is combinatoric, on the
//!   producers of the states it reads;
//! - inline lists ([`inline_jigsaws`]): a combinatoric jigsaw instead
//!   re-runs the producers of the states it reads, and whatever they depend
//!   on, for every candidate it scores.
//!
//! The execution list is a depth-first post-order over the ordering edges.

use crate::error::ConfigError;
use crate::jigsaw::{Jigsaw, JigsawId, JigsawKind};
use crate::key::Arena;
use crate::list::ObjectList;
use crate::state::{StateId, StateOwner, StateStore};

type Jigsaws = Arena<JigsawId, Box<dyn Jigsaw>>;

fn producer(states: &StateStore, state: StateId) -> Option<JigsawId> {
    match states.get(state)?.owner() {
        StateOwner::Jigsaw(jigsaw, _) => Some(jigsaw),
        StateOwner::Group(_) | StateOwner::Standalone(_) => None,
    }
}

/// Producers of the states `id` reads, excluding itself.
fn dependency_producers(jigsaws: &Jigsaws, states: &StateStore, id: JigsawId) -> ObjectList<JigsawId> {
    let core = jigsaws[id].core();
    let mut producers = ObjectList::new();
    for i in 0..core.n_dependency_states() {
        for state in core.dependency_states(i).iter() {
            if let Some(p) = producer(states, state).filter(|&p| p != id) {
                producers.add(p);
            }
        }
    }
    producers
}

/// Jigsaws that must complete before `id` runs.
pub(crate) fn dependency_jigsaws(jigsaws: &Jigsaws, states: &StateStore, id: JigsawId) -> ObjectList<JigsawId> {
    let jigsaw = &jigsaws[id];
    let mut deps = ObjectList::new();
    if let Some(p) = jigsaw.core().parent_state().and_then(|s| producer(states, s)) {
        deps.add(p);
    }
    if jigsaw.kind() != JigsawKind::Combinatoric {
        deps.add_all(&dependency_producers(jigsaws, states, id));
    }
    deps
}

/// Append `id` to `execution_list`, after everything it depends on.
///
/// Jigsaws already in the list are left in place, so calling this again for
/// the same jigsaw changes nothing.
pub fn initialize_execution_list(
    jigsaws: &Jigsaws,
    id: JigsawId,
    execution_list: &mut ObjectList<JigsawId>,
) -> Result<(), ConfigError> {
    let mut path = Vec::new();
    visit(jigsaws, id, execution_list, &mut path)
}

fn visit(
    jigsaws: &Jigsaws,
    id: JigsawId,
    execution_list: &mut ObjectList<JigsawId>,
    path: &mut Vec<JigsawId>,
) -> Result<(), ConfigError> {
    if execution_list.contains(&id) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|&p| p == id) {
        let cycle = path[start..]
            .iter()
            .chain(std::iter::once(&id))
            .map(|&j| name(jigsaws, j))
            .collect();
        return Err(ConfigError::CyclicDependency { cycle });
    }
    let jigsaw = jigsaws
        .get(id)
        .ok_or_else(|| ConfigError::UnknownJigsaw(id.to_string()))?;

    path.push(id);
    for dep in jigsaw.core().dependency_jigsaws().iter() {
        visit(jigsaws, dep, execution_list, path)?;
    }
    path.pop();
    execution_list.add(id);
    Ok(())
}

fn name(jigsaws: &Jigsaws, id: JigsawId) -> String {
    jigsaws
        .get(id)
        .map(|j| j.name().to_string())
        .unwrap_or_else(|| id.to_string())
}

/// Jigsaws a combinatoric jigsaw runs for every candidate, in execution
/// order: the producers of the states it reads, with their own
/// prerequisites, limited to those scheduled after it.
pub(crate) fn inline_jigsaws(
    jigsaws: &Jigsaws,
    states: &StateStore,
    execution_list: &ObjectList<JigsawId>,
    id: JigsawId,
) -> ObjectList<JigsawId> {
    if jigsaws[id].kind() != JigsawKind::Combinatoric {
        return ObjectList::new();
    }
    let Some(position) = execution_list.index_of(&id) else {
        return ObjectList::new();
    };

    let mut closure = ObjectList::new();
    let mut stack: Vec<JigsawId> = dependency_producers(jigsaws, states, id).iter().collect();
    while let Some(j) = stack.pop() {
        if closure.add(j) {
            if let Some(jigsaw) = jigsaws.get(j) {
                stack.extend(jigsaw.core().dependency_jigsaws().iter());
            }
        }
    }

    execution_list
        .iter()
        .skip(position + 1)
        .filter(|j| closure.contains(j))
        .collect()
}

/// True if `id` runs after `other` because of a chain of ordering edges.
pub fn depends_on(jigsaws: &Jigsaws, id: JigsawId, other: JigsawId) -> bool {
    let mut seen = ObjectList::new();
    let mut stack: Vec<JigsawId> = match jigsaws.get(id) {
        Some(jigsaw) => jigsaw.core().dependency_jigsaws().iter().collect(),
        None => return false,
    };
    while let Some(j) = stack.pop() {
        if j == other {
            return true;
        }
        if seen.add(j) {
            if let Some(jigsaw) = jigsaws.get(j) {
                stack.extend(jigsaw.core().dependency_jigsaws().iter());
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EventContext;
    use crate::error::ResolveFailure;
    use crate::jigsaw::JigsawCore;
    use crate::key::KeyRegistry;

    #[derive(Debug)]
    struct Node {
        core: JigsawCore,
    }

    impl Jigsaw for Node {
        fn core(&self) -> &JigsawCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut JigsawCore {
            &mut self.core
        }

        fn analyze_event(&self, _ctx: &mut EventContext<'_>) -> Result<(), ResolveFailure> {
            Ok(())
        }
    }

    /// Jigsaws wired directly by ordering edges: `edges[i]` lists the
    /// positions jigsaw `i` depends on.
    fn graph(edges: &[&[usize]]) -> (Jigsaws, Vec<JigsawId>) {
        let mut keys = KeyRegistry::new();
        let ids: Vec<JigsawId> = edges.iter().map(|_| JigsawId(keys.issue())).collect();
        let mut jigsaws: Jigsaws = Arena::new();
        for (i, deps) in edges.iter().enumerate() {
            let mut core = JigsawCore::new(&format!("J{}", i), 1);
            core.set_dependency_jigsaws(deps.iter().map(|&d| ids[d]).collect());
            jigsaws.insert(ids[i], Box::new(Node { core }));
        }
        (jigsaws, ids)
    }

    #[test]
    fn test_dependencies_come_first() {
        let (jigsaws, ids) = graph(&[&[1, 2], &[3], &[3], &[]]);
        let mut list = ObjectList::new();
        initialize_execution_list(&jigsaws, ids[0], &mut list).unwrap();
        assert_eq!(list.as_slice(), &[ids[3], ids[1], ids[2], ids[0]]);
        for i in 0..ids.len() {
            for j in jigsaws[ids[i]].core().dependency_jigsaws().iter() {
                assert!(list.index_of(&j) < list.index_of(&ids[i]));
            }
        }
    }

    #[test]
    fn test_execution_list_is_idempotent() {
        let (jigsaws, ids) = graph(&[&[1], &[]]);
        let mut list = ObjectList::new();
        initialize_execution_list(&jigsaws, ids[0], &mut list).unwrap();
        let first = list.clone();
        initialize_execution_list(&jigsaws, ids[0], &mut list).unwrap();
        initialize_execution_list(&jigsaws, ids[1], &mut list).unwrap();
        assert_eq!(list, first);
    }

    #[test]
    fn test_cycle_detected() {
        let (jigsaws, ids) = graph(&[&[1], &[2], &[0]]);
        let mut list = ObjectList::new();
        match initialize_execution_list(&jigsaws, ids[0], &mut list) {
            Err(ConfigError::CyclicDependency { cycle }) => {
                assert_eq!(cycle, vec!["J0", "J1", "J2", "J0"]);
            }
            other => panic!("expected a cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_depends_on_is_transitive() {
        let (jigsaws, ids) = graph(&[&[1], &[2], &[]]);
        assert!(depends_on(&jigsaws, ids[0], ids[2]));
        assert!(!depends_on(&jigsaws, ids[2], ids[0]));
    }
}
