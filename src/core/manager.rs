//! Kit tree manager
//!
//! Keeps the component lines of every kit root in step with the root.
//! Creating a line explodes its kit, changing a root's product, quantity or
//! unit purges and re-explodes its subtree, and deleting a root removes the
//! whole subtree.
//!
//! Explosion runs off an explicit stack of pending components rather than
//! recursive create calls, so depth and cycle guards are simple checks on
//! each pending item and the call stack stays flat however deep kits nest.

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::core::config::{ComponentDeletePolicy, KitConfig};
use crate::core::error::KitError;
use crate::core::identity::{LineId, ProductId};
use crate::core::kits::{KitComponent, KitDefinitionSource};
use crate::core::line::{ExpansionState, Line, LineChanges, NewLine};
use crate::core::store::{LineFilter, LineStore};
use crate::core::units::{ConversionError, UnitConverter};

/// A component waiting to be materialized under `parent`
struct Pending {
    parent: LineId,
    component: KitComponent,
    /// Products from the tree root down to and including `parent`
    ancestry: Vec<ProductId>,
}

/// Maintains kit trees over a line store
pub struct KitTreeManager<S, U, K> {
    store: S,
    units: U,
    kits: K,
    config: KitConfig,
}

impl<S, U, K> KitTreeManager<S, U, K>
where
    S: LineStore,
    U: UnitConverter,
    K: KitDefinitionSource,
{
    pub fn new(store: S, units: U, kits: K, config: KitConfig) -> Self {
        Self {
            store,
            units,
            kits,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =====================================================================
    // External operations
    // =====================================================================

    /// Create a root line and explode its kit
    pub fn create_line(&mut self, new: NewLine) -> Result<LineId, KitError> {
        self.transaction(|m| {
            let line = Line::root(new);
            let id = line.id.clone();
            let created = m.create(&line)?;
            info!(line = %id, product = %line.product, components = created, "created line");
            Ok(id)
        })
    }

    /// Materialize the kit of an existing line
    ///
    /// Returns the number of lines created, 0 if the line was already
    /// expanded.
    pub fn explode_kit(&mut self, id: &LineId) -> Result<usize, KitError> {
        self.transaction(|m| m.expand(id))
    }

    /// Apply `changes` to every line in `ids`
    ///
    /// A line whose product, quantity or unit value actually changes has its
    /// subtree deleted and re-exploded. Writing the current value back is a
    /// plain update.
    pub fn update_lines(&mut self, ids: &[LineId], changes: &LineChanges) -> Result<(), KitError> {
        self.transaction(|m| m.reconcile_update(ids, changes))
    }

    /// Delete lines together with their subtrees
    ///
    /// Returns the number of lines removed.
    pub fn delete_lines(&mut self, ids: &[LineId]) -> Result<usize, KitError> {
        self.transaction(|m| m.reconcile_delete(ids))
    }

    /// Ids of every descendant of `id`, depth-first, parents before children
    pub fn list_descendants(&self, id: &LineId) -> Result<Vec<LineId>, KitError> {
        self.fetch(id)?;
        self.kit_tree_ids(id)
    }

    pub fn get_line(&self, id: &LineId) -> Result<Line, KitError> {
        self.fetch(id)
    }

    pub fn list_lines(&self, filter: &LineFilter) -> Result<Vec<Line>, KitError> {
        Ok(self.store.find(filter)?)
    }

    /// Root of the kit tree `id` belongs to
    pub fn kit_root(&self, id: &LineId) -> Result<LineId, KitError> {
        let mut line = self.fetch(id)?;
        while let Some(parent) = line.kit_parent_line.clone() {
            line = self.fetch(&parent)?;
        }
        Ok(line.id)
    }

    // =====================================================================
    // Transactions
    // =====================================================================

    fn transaction<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, KitError>,
    ) -> Result<T, KitError> {
        self.store.begin()?;
        match f(self) {
            Ok(value) => {
                self.store.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.store.rollback() {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    // =====================================================================
    // Tree walking
    // =====================================================================

    fn fetch(&self, id: &LineId) -> Result<Line, KitError> {
        self.store
            .get(id)?
            .ok_or_else(|| KitError::NotFound(id.clone()))
    }

    /// Pre-order walk of the subtree below `id`, excluding `id` itself
    fn kit_tree_ids(&self, id: &LineId) -> Result<Vec<LineId>, KitError> {
        let mut ids = Vec::new();
        let mut stack: Vec<LineId> = self.store.children(id)?.into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            let children = self.store.children(&next)?;
            stack.extend(children.into_iter().rev());
            ids.push(next);
        }
        Ok(ids)
    }

    /// Products of the strict ancestors of `line`, root first
    fn ancestry(&self, line: &Line) -> Result<Vec<ProductId>, KitError> {
        let mut products = Vec::new();
        let mut parent = line.kit_parent_line.clone();
        while let Some(id) = parent {
            let ancestor = self.fetch(&id)?;
            products.push(ancestor.product);
            parent = ancestor.kit_parent_line;
        }
        products.reverse();
        Ok(products)
    }

    /// First free sequence number in the tree `line` belongs to
    fn next_sequence(&self, line: &Line) -> Result<i64, KitError> {
        let root = if line.is_component() {
            self.kit_root(&line.id)?
        } else {
            line.id.clone()
        };
        let mut max: i64 = 0;
        for id in self.kit_tree_ids(&root)? {
            max = max.max(self.fetch(&id)?.sequence);
        }
        Ok(max + 1)
    }

    // =====================================================================
    // Expansion
    // =====================================================================

    /// Store a new root line, then explode it
    fn create(&mut self, line: &Line) -> Result<usize, KitError> {
        self.store.insert(line)?;
        self.expand(&line.id)
    }

    fn expand(&mut self, id: &LineId) -> Result<usize, KitError> {
        let line = self.fetch(id)?;
        if line.is_expanded() {
            debug!(line = %id, "already expanded");
            return Ok(0);
        }

        let mut sequence = self.next_sequence(&line)?;
        let ancestry = self.ancestry(&line)?;
        let mut pending = Vec::new();
        self.schedule(line, ancestry, &mut pending)?;

        let mut created = 0;
        while let Some(next) = pending.pop() {
            let parent = self.fetch(&next.parent)?;
            let child = self.synthesize(&parent, &next.component, sequence)?;
            sequence += 1;

            self.store.insert(&child)?;
            created += 1;
            debug!(
                line = %child.id,
                parent = %parent.id,
                product = %child.product,
                quantity = %child.quantity,
                depth = child.kit_depth,
                "synthesized component line"
            );

            self.schedule(child, next.ancestry, &mut pending)?;
        }
        Ok(created)
    }

    /// Mark `line` expanded and queue its kit components
    ///
    /// Components are pushed in reverse so they pop in definition order,
    /// giving a depth-first, pre-order creation sequence.
    fn schedule(
        &mut self,
        mut line: Line,
        mut ancestry: Vec<ProductId>,
        pending: &mut Vec<Pending>,
    ) -> Result<(), KitError> {
        let components = self.kits.kit_lines_of(&line.product);
        ancestry.push(line.product.clone());

        if !components.is_empty() {
            if line.kit_depth + 1 > self.config.max_depth {
                return Err(KitError::MaxDepthExceeded {
                    max_depth: self.config.max_depth,
                    product: line.product.clone(),
                });
            }
            for component in components.into_iter().rev() {
                if ancestry.contains(&component.product) {
                    let mut path = ancestry.clone();
                    path.push(component.product.clone());
                    return Err(KitError::CyclicKitDefinition {
                        product: component.product,
                        path,
                    });
                }
                pending.push(Pending {
                    parent: line.id.clone(),
                    component,
                    ancestry: ancestry.clone(),
                });
            }
        }

        line.expansion = ExpansionState::Expanded;
        self.store.update(&line)?;
        Ok(())
    }

    /// Build the component line for one kit entry of `parent`
    fn synthesize(
        &self,
        parent: &Line,
        component: &KitComponent,
        sequence: i64,
    ) -> Result<Line, KitError> {
        let per_unit = self
            .units
            .convert(&component.unit, component.quantity, &parent.unit)?;
        let quantity = scale(per_unit, parent.quantity).ok_or_else(|| ConversionError::Overflow {
            from: component.unit.clone(),
            to: parent.unit.clone(),
        })?;
        Ok(parent.component(component.product.clone(), quantity, sequence))
    }

    // =====================================================================
    // Reconciliation
    // =====================================================================

    fn reconcile_update(&mut self, ids: &[LineId], changes: &LineChanges) -> Result<(), KitError> {
        if !changes.touches_kit() {
            for id in ids {
                let mut line = self.fetch(id)?;
                changes.apply_to(&mut line);
                self.store.update(&line)?;
            }
            return Ok(());
        }

        // Subtrees purged by roots in this batch; components in them are
        // rebuilt with their root, not re-kitted on their own
        let mut covered: HashSet<LineId> = HashSet::new();
        for id in ids {
            let line = self.fetch(id)?;
            if !line.is_component() && changes.alters_kit(&line) {
                covered.extend(self.kit_tree_ids(id)?);
            }
        }

        // Reject before touching anything so the outcome does not depend on
        // the order of `ids`
        for id in ids {
            let line = self.fetch(id)?;
            if line.is_component() && !covered.contains(id) && changes.alters_kit(&line) {
                return Err(KitError::ComponentLine {
                    id: id.clone(),
                    operation: "re-kitted",
                });
            }
        }

        for id in ids {
            if covered.contains(id) {
                continue;
            }
            let mut line = self.fetch(id)?;
            let reset = changes.alters_kit(&line);

            if reset {
                let subtree = self.kit_tree_ids(id)?;
                let deleted = self.store.delete(&subtree)?;
                debug!(line = %id, deleted, "purged kit subtree");
                line.expansion = ExpansionState::Unexpanded;
            }

            changes.apply_to(&mut line);
            self.store.update(&line)?;

            if reset {
                let created = self.expand(id)?;
                info!(line = %id, product = %line.product, components = created, "re-exploded kit");
            }
        }
        Ok(())
    }

    fn reconcile_delete(&mut self, ids: &[LineId]) -> Result<usize, KitError> {
        let mut doomed: Vec<LineId> = Vec::new();
        let mut seen: HashSet<LineId> = HashSet::new();

        // Components under a root of this batch go with their root
        let mut covered: HashSet<LineId> = HashSet::new();
        for id in ids {
            if !self.fetch(id)?.is_component() {
                covered.extend(self.kit_tree_ids(id)?);
            }
        }

        for id in ids {
            let line = self.fetch(id)?;
            let top = if line.is_component() && !covered.contains(id) {
                match self.config.component_delete {
                    ComponentDeletePolicy::Reject => {
                        return Err(KitError::ComponentLine {
                            id: id.clone(),
                            operation: "deleted",
                        })
                    }
                    ComponentDeletePolicy::Cascade => self.kit_root(id)?,
                    ComponentDeletePolicy::Detach => id.clone(),
                }
            } else {
                id.clone()
            };

            if seen.insert(top.clone()) {
                doomed.push(top.clone());
            }
            for descendant in self.kit_tree_ids(&top)? {
                if seen.insert(descendant.clone()) {
                    doomed.push(descendant);
                }
            }
        }

        let removed = self.store.delete(&doomed)?;
        info!(requested = ids.len(), removed, "deleted lines");
        Ok(removed)
    }
}

/// Per-unit component quantity times the parent quantity, normalized
fn scale(per_unit: Decimal, parent_quantity: Decimal) -> Option<Decimal> {
    per_unit.checked_mul(parent_quantity).map(|q| q.normalize())
}
