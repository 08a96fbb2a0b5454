use std::{collections::HashMap, sync::Arc};

use crate::{
    aop::{
        advice::{AdviceBinding, AdviceChain},
        pointcut::PointcutTarget,
        proxy::ProxyParts,
    },
    descriptor::{ComponentDescriptor, Exposure},
    scope::Bean,
    types::Instance,
};

/// Decides per exposed capability whether a component needs a proxy
///
/// Proxies are created once, when the component is constructed. A capability
/// no advice applies to is handed out as the raw instance.
#[derive(Default)]
pub struct ProxyWeaver {
    bindings: Vec<Arc<AdviceBinding>>,
}

impl ProxyWeaver {
    pub fn new(bindings: Vec<Arc<AdviceBinding>>) -> Self {
        Self { bindings }
    }

    pub(crate) fn wrap(&self, descriptor: &ComponentDescriptor, raw: Instance) -> Bean {
        let mut views = HashMap::new();
        for exposure in descriptor.exposures() {
            let view = match self.weave(descriptor, exposure, &raw) {
                Some(proxy) => Some(proxy),
                None => exposure.upcast(&raw),
            };
            match view {
                Some(view) => {
                    views.insert(exposure.info().type_id, view);
                }
                None => tracing::warn!(
                    component = %descriptor.name(),
                    capability = %exposure.info(),
                    "Instance could not be presented as capability"
                ),
            }
        }
        Bean::new(descriptor.name(), raw, views)
    }

    fn weave(
        &self,
        descriptor: &ComponentDescriptor,
        exposure: &Exposure,
        raw: &Instance,
    ) -> Option<Instance> {
        let advised = exposure.advised_exposure()?;
        let target = PointcutTarget {
            component: descriptor.name(),
            declared_type: descriptor.declared_type(),
            capability: exposure.info(),
        };

        let chains: HashMap<_, _> = advised
            .methods
            .iter()
            .map(|method| AdviceChain::assemble(&self.bindings, &target, method))
            .filter(|chain| !chain.is_empty())
            .map(|chain| (chain.method.name(), Arc::new(chain)))
            .collect();
        if chains.is_empty() {
            return None;
        }

        tracing::debug!(
            component = %descriptor.name(),
            capability = %exposure.info(),
            methods = ?chains.keys().collect::<Vec<_>>(),
            "Weaving proxy"
        );
        (advised.weave)(
            raw,
            ProxyParts {
                component: Arc::from(descriptor.name()),
                declared_type: descriptor.declared_type(),
                chains,
            },
        )
    }
}
