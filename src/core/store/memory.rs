//! In-memory line arena

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::{LineFilter, LineStore, StoreError};
use crate::core::identity::LineId;
use crate::core::line::Line;

#[derive(Debug, Clone, Default)]
struct Arena {
    lines: BTreeMap<LineId, Line>,
    /// parent id -> child ids, maintained on every insert/update/delete
    children: HashMap<LineId, Vec<LineId>>,
}

impl Arena {
    fn link(&mut self, line: &Line) {
        if let Some(parent) = &line.kit_parent_line {
            self.children
                .entry(parent.clone())
                .or_default()
                .push(line.id.clone());
        }
    }

    fn unlink(&mut self, line: &Line) {
        if let Some(parent) = &line.kit_parent_line {
            if let Some(siblings) = self.children.get_mut(parent) {
                siblings.retain(|id| *id != line.id);
                if siblings.is_empty() {
                    self.children.remove(parent);
                }
            }
        }
    }

    fn sort_key(&self, id: &LineId) -> (i64, LineId) {
        let sequence = self.lines.get(id).map(|l| l.sequence).unwrap_or_default();
        (sequence, id.clone())
    }
}

/// Line store backed by an in-memory arena
///
/// Transactions snapshot the arena on `begin` and restore it on `rollback`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    arena: Arena,
    snapshot: Option<Arena>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arena.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.lines.is_empty()
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl LineStore for MemoryStore {
    fn insert(&mut self, line: &Line) -> Result<(), StoreError> {
        if self.arena.lines.contains_key(&line.id) {
            return Err(StoreError::Duplicate(line.id.clone()));
        }
        if let Some(parent) = &line.kit_parent_line {
            if !self.arena.lines.contains_key(parent) {
                return Err(StoreError::MissingParent {
                    line: line.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
        self.arena.link(line);
        self.arena.lines.insert(line.id.clone(), line.clone());
        Ok(())
    }

    fn get(&self, id: &LineId) -> Result<Option<Line>, StoreError> {
        Ok(self.arena.lines.get(id).cloned())
    }

    fn update(&mut self, line: &Line) -> Result<(), StoreError> {
        let previous = self
            .arena
            .lines
            .get(&line.id)
            .cloned()
            .ok_or_else(|| StoreError::Missing(line.id.clone()))?;

        if previous.kit_parent_line != line.kit_parent_line {
            if let Some(parent) = &line.kit_parent_line {
                if !self.arena.lines.contains_key(parent) {
                    return Err(StoreError::MissingParent {
                        line: line.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            self.arena.unlink(&previous);
            self.arena.link(line);
        }
        self.arena.lines.insert(line.id.clone(), line.clone());
        Ok(())
    }

    fn delete(&mut self, ids: &[LineId]) -> Result<usize, StoreError> {
        let doomed: HashSet<&LineId> = ids.iter().collect();

        for id in &doomed {
            if let Some(children) = self.arena.children.get(*id) {
                if let Some(child) = children.iter().find(|c| !doomed.contains(c)) {
                    return Err(StoreError::WouldOrphan {
                        parent: (*id).clone(),
                        child: child.clone(),
                    });
                }
            }
        }

        let mut removed = 0;
        for id in doomed {
            if let Some(line) = self.arena.lines.remove(id) {
                self.arena.unlink(&line);
                self.arena.children.remove(id);
                removed += 1;
            }
        }
        debug!(removed, "deleted lines from memory store");
        Ok(removed)
    }

    fn children(&self, id: &LineId) -> Result<Vec<LineId>, StoreError> {
        let mut children = self.arena.children.get(id).cloned().unwrap_or_default();
        children.sort_by_key(|c| self.arena.sort_key(c));
        Ok(children)
    }

    fn find(&self, filter: &LineFilter) -> Result<Vec<Line>, StoreError> {
        let mut lines: Vec<Line> = self
            .arena
            .lines
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        lines.sort_by(|a, b| (a.sequence, &a.id).cmp(&(b.sequence, &b.id)));
        Ok(lines)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.snapshot.is_some() {
            return Err(StoreError::TransactionActive);
        }
        self.snapshot = Some(self.arena.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or(StoreError::NoTransaction)
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        let snapshot = self.snapshot.take().ok_or(StoreError::NoTransaction)?;
        self.arena = snapshot;
        Ok(())
    }
}
