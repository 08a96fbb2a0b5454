use std::{any::TypeId, collections::HashMap, sync::Arc};

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::{
    descriptor::{ComponentDescriptor, Scope},
    errors::{ResolveError, StartupFailure},
    types::{Instance, TypeInfo},
};

/// A constructed component together with the views handed out per exposed type
///
/// Views are either the raw instance upcast to a capability, or a proxy when
/// advice applies to that capability.
#[derive(Clone)]
pub struct Bean {
    name: Arc<str>,
    raw: Instance,
    views: Arc<HashMap<TypeId, Instance>>,
}

impl std::fmt::Debug for Bean {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bean")
            .field("name", &self.name)
            .field("raw", &self.raw)
            .field("views", &self.views.len())
            .finish()
    }
}

impl Bean {
    pub(crate) fn new(name: &str, raw: Instance, views: HashMap<TypeId, Instance>) -> Self {
        Self {
            name: Arc::from(name),
            raw,
            views: Arc::new(views),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The undecorated instance
    pub fn raw(&self) -> &Instance {
        &self.raw
    }

    /// The instance as seen through `type_info`
    pub fn view(&self, type_info: TypeInfo) -> Result<Instance, ResolveError> {
        self.views
            .get(&type_info.type_id)
            .cloned()
            .ok_or_else(|| ResolveError::TypeMismatch {
                component: self.name.to_string(),
                required_type: type_info.type_name,
                actual_type: self.raw.info.type_name,
            })
    }
}

/// Lifecycle state of a singleton slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    NotYetBuilt,
    Built,
}

/// Applies scope policy: caches singletons, builds prototypes fresh
///
/// Every singleton owns a once cell. Racing first requests block on the cell
/// until the winner finished, so a singleton is constructed at most once.
#[derive(Default)]
pub struct ScopeManager {
    singletons: DashMap<String, Arc<OnceCell<Bean>>>,
    construction_order: Mutex<Vec<String>>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn obtain(
        &self,
        descriptor: &ComponentDescriptor,
        build: impl FnOnce() -> Result<Bean, ResolveError>,
    ) -> Result<Bean, ResolveError> {
        if descriptor.scope() == Scope::Prototype {
            return build();
        }

        let slot = self.slot(descriptor.name());
        if let Some(bean) = slot.get() {
            tracing::trace!(component = %descriptor.name(), "Singleton cache hit");
            return Ok(bean.clone());
        }

        let mut built_here = false;
        let bean = slot
            .get_or_try_init(|| {
                let bean = build()?;
                built_here = true;
                Ok::<_, ResolveError>(bean)
            })?
            .clone();

        if built_here {
            self.construction_order
                .lock()
                .push(descriptor.name().to_owned());
            tracing::debug!(component = %descriptor.name(), "Singleton cached");
        }
        Ok(bean)
    }

    /// The shard lock is only held while fetching the slot, never during construction
    fn slot(&self, name: &str) -> Arc<OnceCell<Bean>> {
        if let Some(slot) = self.singletons.get(name) {
            return slot.clone();
        }
        self.singletons
            .entry(name.to_owned())
            .or_default()
            .clone()
    }

    pub fn state(&self, name: &str) -> SlotState {
        match self.singletons.get(name) {
            Some(slot) if slot.get().is_some() => SlotState::Built,
            _ => SlotState::NotYetBuilt,
        }
    }

    pub fn is_built(&self, name: &str) -> bool {
        self.state(name) == SlotState::Built
    }

    /// Builds every eager singleton, collecting failures instead of stopping at the first
    pub(crate) fn pre_instantiate(
        &self,
        descriptors: &[Arc<ComponentDescriptor>],
        resolve: impl Fn(&Arc<ComponentDescriptor>) -> Result<Bean, ResolveError>,
    ) -> Vec<StartupFailure> {
        descriptors
            .iter()
            .filter(|descriptor| descriptor.scope() == Scope::Singleton && !descriptor.is_lazy())
            .filter_map(|descriptor| match resolve(descriptor) {
                Ok(_) => None,
                Err(error) => Some(StartupFailure {
                    component: descriptor.name().to_owned(),
                    error,
                }),
            })
            .collect()
    }

    /// Drops the slot of a component that is being unregistered
    pub(crate) fn forget(&self, name: &str) {
        self.singletons.remove(name);
        self.construction_order.lock().retain(|built| built != name);
    }

    /// Drops every built singleton, running destroy hooks in reverse construction order
    ///
    /// Each slot is removed before its hook runs, so concurrent teardowns
    /// destroy every singleton at most once.
    pub(crate) fn teardown(
        &self,
        descriptor_of: impl Fn(&str) -> Option<Arc<ComponentDescriptor>>,
    ) {
        let order = std::mem::take(&mut *self.construction_order.lock());
        for name in order.iter().rev() {
            let Some((_, slot)) = self.singletons.remove(name) else {
                continue;
            };
            let (Some(descriptor), Some(bean)) = (descriptor_of(name), slot.get()) else {
                continue;
            };
            tracing::debug!(component = %name, "Destroying singleton");
            descriptor.destroy(bean.raw());
        }
    }
}
