//! System registration and ordering.
//!
//! Systems are registered once, globally per host, in a [`SystemRegistry`].
//! Each registration names the system type, the group it runs in, an
//! optional world type it is restricted to, and ordering constraints
//! against other systems. When a world is created from the registry, each
//! group's systems are instantiated in a deterministic topological order:
//! constraints first, registration order to break ties.

use std::any::{TypeId, type_name};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use tessera_foundation::{Error, Result};

use crate::world::World;

/// A unit of per-frame logic.
pub trait System: Send + 'static {
    /// Runs the system once.
    ///
    /// # Errors
    ///
    /// Errors are propagated out of [`World::run_group`].
    fn run(&mut self, world: &mut World) -> Result<()>;
}

/// Group every system runs in unless registered elsewhere.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultSystemGroup;

// =============================================================================
// Type Keys
// =============================================================================

/// Runtime identity of a system, group, or world type.
#[derive(Copy, Clone)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key for `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The underlying type id.
    #[must_use]
    pub fn type_id(self) -> TypeId {
        self.id
    }

    /// Full type name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl std::hash::Hash for TypeKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// =============================================================================
// Registry
// =============================================================================

type Factory = Box<dyn Fn() -> Box<dyn System> + Send + Sync>;

/// One registered system type.
pub struct SystemDescriptor {
    system: TypeKey,
    world: Option<TypeKey>,
    group: TypeKey,
    before: Vec<TypeKey>,
    after: Vec<TypeKey>,
    factory: Factory,
}

impl SystemDescriptor {
    /// Restricts the system to worlds created for `W`.
    pub fn in_world<W: 'static>(&mut self) -> &mut Self {
        self.world = Some(TypeKey::of::<W>());
        self
    }

    /// Places the system in group `G`.
    pub fn in_group<G: 'static>(&mut self) -> &mut Self {
        self.group = TypeKey::of::<G>();
        self
    }

    /// Runs this system before `S` when both are in the same group.
    pub fn before<S: System>(&mut self) -> &mut Self {
        self.before.push(TypeKey::of::<S>());
        self
    }

    /// Runs this system after `S` when both are in the same group.
    pub fn after<S: System>(&mut self) -> &mut Self {
        self.after.push(TypeKey::of::<S>());
        self
    }

    /// The system type.
    #[must_use]
    pub fn system(&self) -> TypeKey {
        self.system
    }

    /// The group the system runs in.
    #[must_use]
    pub fn group(&self) -> TypeKey {
        self.group
    }

    /// The world type the system is restricted to, if any.
    #[must_use]
    pub fn world(&self) -> Option<TypeKey> {
        self.world
    }

    fn runs_in(&self, world: TypeKey) -> bool {
        self.world.is_none_or(|w| w == world)
    }
}

impl fmt::Debug for SystemDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemDescriptor")
            .field("system", &self.system)
            .field("world", &self.world)
            .field("group", &self.group)
            .field("before", &self.before)
            .field("after", &self.after)
            .finish_non_exhaustive()
    }
}

/// Resolved run order of one group.
#[derive(Clone, Debug)]
struct GroupPlan {
    group: TypeKey,
    order: Vec<usize>,
}

/// Every registered system, plus cached per-world run orders.
#[derive(Default)]
pub struct SystemRegistry {
    descriptors: Vec<SystemDescriptor>,
    index: HashMap<TypeId, usize>,
    plans: HashMap<TypeId, Vec<GroupPlan>>,
}

impl SystemRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers system type `S`, built by `factory` for each new world.
    ///
    /// The system starts in [`DefaultSystemGroup`] with no world
    /// restriction or constraints. Registering the same type again
    /// replaces the earlier registration in place.
    pub fn register<S: System>(
        &mut self,
        factory: impl Fn() -> S + Send + Sync + 'static,
    ) -> &mut SystemDescriptor {
        self.plans.clear();
        let descriptor = SystemDescriptor {
            system: TypeKey::of::<S>(),
            world: None,
            group: TypeKey::of::<DefaultSystemGroup>(),
            before: Vec::new(),
            after: Vec::new(),
            factory: Box::new(move || Box::new(factory()) as Box<dyn System>),
        };
        let slot = match self.index.get(&TypeId::of::<S>()) {
            Some(&slot) => {
                tracing::warn!(system = type_name::<S>(), "system registered twice, replacing");
                self.descriptors[slot] = descriptor;
                slot
            }
            None => {
                let slot = self.descriptors.len();
                self.index.insert(TypeId::of::<S>(), slot);
                self.descriptors.push(descriptor);
                slot
            }
        };
        &mut self.descriptors[slot]
    }

    /// Registers `S` using its [`Default`] implementation.
    pub fn register_default<S: System + Default>(&mut self) -> &mut SystemDescriptor {
        self.register(S::default)
    }

    /// Returns true if `S` is registered.
    #[must_use]
    pub fn contains<S: System>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<S>())
    }

    /// Number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if no system is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registered systems in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SystemDescriptor> {
        self.descriptors.iter()
    }

    /// Number of world types with a cached run order.
    #[must_use]
    pub fn cached_plans(&self) -> usize {
        self.plans.len()
    }

    /// Forgets every cached run order, e.g. after a code reload.
    pub fn clear_cache(&mut self) {
        self.plans.clear();
    }

    /// Resolved system names per group for world type `W`, in run order.
    ///
    /// # Errors
    ///
    /// Returns `CyclicDependency` if a group's constraints form a cycle.
    pub fn run_order<W: 'static>(&mut self) -> Result<Vec<(TypeKey, Vec<TypeKey>)>> {
        let plans = self.plan(TypeKey::of::<W>())?;
        Ok(plans
            .into_iter()
            .map(|plan| {
                let systems = plan.order.iter().map(|&i| self.descriptors[i].system).collect();
                (plan.group, systems)
            })
            .collect())
    }

    /// Instantiates every group for world type `W`.
    pub(crate) fn instantiate(&mut self, world: TypeKey) -> Result<Vec<SystemGroup>> {
        let plans = self.plan(world)?;
        Ok(plans
            .into_iter()
            .map(|plan| {
                let systems = plan
                    .order
                    .iter()
                    .map(|&i| {
                        let descriptor = &self.descriptors[i];
                        SystemEntry {
                            key: descriptor.system,
                            system: (descriptor.factory)(),
                        }
                    })
                    .collect();
                SystemGroup {
                    key: plan.group,
                    systems,
                }
            })
            .collect())
    }

    fn plan(&mut self, world: TypeKey) -> Result<Vec<GroupPlan>> {
        if let Some(plans) = self.plans.get(&world.id) {
            return Ok(plans.clone());
        }

        let mut groups: Vec<(TypeKey, Vec<usize>)> = Vec::new();
        for (i, descriptor) in self.descriptors.iter().enumerate() {
            if !descriptor.runs_in(world) {
                continue;
            }
            match groups.iter_mut().find(|(group, _)| *group == descriptor.group) {
                Some((_, members)) => members.push(i),
                None => groups.push((descriptor.group, vec![i])),
            }
        }

        let plans = groups
            .into_iter()
            .map(|(group, members)| {
                let order = order_group(group, &members, &self.descriptors)?;
                Ok(GroupPlan { group, order })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(world = world.name, groups = plans.len(), "system order resolved");
        self.plans.insert(world.id, plans.clone());
        Ok(plans)
    }
}

impl fmt::Debug for SystemRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemRegistry")
            .field("systems", &self.descriptors)
            .field("cached_plans", &self.plans.len())
            .finish()
    }
}

/// Orders `members` (indices into `descriptors`, in registration order).
fn order_group(
    group: TypeKey,
    members: &[usize],
    descriptors: &[SystemDescriptor],
) -> Result<Vec<usize>> {
    let local: HashMap<TypeId, usize> = members
        .iter()
        .enumerate()
        .map(|(local, &i)| (descriptors[i].system.id, local))
        .collect();

    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); members.len()];
    let mut indegree = vec![0usize; members.len()];
    let mut link = |from: usize, to: usize| {
        edges[from].push(to);
        indegree[to] += 1;
    };

    for (this, &i) in members.iter().enumerate() {
        let descriptor = &descriptors[i];
        for other in &descriptor.before {
            match local.get(&other.id) {
                Some(&that) => link(this, that),
                None => warn_foreign(descriptor, *other, group),
            }
        }
        for other in &descriptor.after {
            match local.get(&other.id) {
                Some(&that) => link(that, this),
                None => warn_foreign(descriptor, *other, group),
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = indegree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(local, _)| Reverse(local))
        .collect();
    let mut order = Vec::with_capacity(members.len());
    while let Some(Reverse(next)) = ready.pop() {
        order.push(members[next]);
        for &to in &edges[next] {
            indegree[to] -= 1;
            if indegree[to] == 0 {
                ready.push(Reverse(to));
            }
        }
    }

    if order.len() < members.len() {
        let stuck = indegree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .map(|(local, _)| descriptors[members[local]].system.name.to_string())
            .collect();
        return Err(Error::cyclic_dependency(group.name, stuck));
    }
    Ok(order)
}

fn warn_foreign(descriptor: &SystemDescriptor, other: TypeKey, group: TypeKey) {
    tracing::warn!(
        system = descriptor.system.name,
        other = other.name,
        group = group.name,
        "ordering constraint names a system outside the group, ignored"
    );
}

// =============================================================================
// Groups
// =============================================================================

/// An instantiated system.
pub struct SystemEntry {
    key: TypeKey,
    system: Box<dyn System>,
}

impl SystemEntry {
    /// The system's type key.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Full type name of the system.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.key.name
    }

    /// Returns true if this entry is an `S`.
    #[must_use]
    pub fn is<S: System>(&self) -> bool {
        self.key.id == TypeId::of::<S>()
    }

    pub(crate) fn run(&mut self, world: &mut World) -> Result<()> {
        self.system.run(world)
    }
}

impl fmt::Debug for SystemEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemEntry({})", self.key.name)
    }
}

/// The ordered systems of one group in one world.
#[derive(Debug)]
pub struct SystemGroup {
    key: TypeKey,
    systems: Vec<SystemEntry>,
}

impl SystemGroup {
    pub(crate) fn empty(key: TypeKey) -> Self {
        Self {
            key,
            systems: Vec::new(),
        }
    }

    /// The group's type key.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Full type name of the group.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.key.name
    }

    /// Returns true if the group contains an `S`.
    #[must_use]
    pub fn has<S: System>(&self) -> bool {
        self.systems.iter().any(SystemEntry::is::<S>)
    }

    /// Run position of `S`, if present.
    #[must_use]
    pub fn position<S: System>(&self) -> Option<usize> {
        self.systems.iter().position(SystemEntry::is::<S>)
    }

    /// Number of systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns true if the group has no systems.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Systems in run order.
    pub fn iter(&self) -> std::slice::Iter<'_, SystemEntry> {
        self.systems.iter()
    }

    pub(crate) fn take_systems(&mut self) -> Vec<SystemEntry> {
        std::mem::take(&mut self.systems)
    }

    pub(crate) fn restore_systems(&mut self, systems: Vec<SystemEntry>) {
        self.systems = systems;
    }
}

impl<'a> IntoIterator for &'a SystemGroup {
    type Item = &'a SystemEntry;
    type IntoIter = std::slice::Iter<'a, SystemEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
