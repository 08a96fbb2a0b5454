use std::{any::type_name, sync::Arc};

use crate::{
    descriptor::Dependency,
    errors::InjectError,
    resolver::Inject,
    types::{Injectable, Instance},
};

impl<T: ?Sized + Injectable> Inject for Arc<T> {
    fn dependency() -> Dependency {
        Dependency::on::<T>()
    }

    fn extract(resolved: Option<&Instance>) -> Result<Self, InjectError> {
        let instance = resolved.ok_or(InjectError::Missing(type_name::<T>()))?;
        instance
            .downcast::<T>()
            .map_err(|actual_type| InjectError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type,
            })
    }
}

impl<Injected: Inject> Inject for Option<Injected> {
    fn dependency() -> Dependency {
        Injected::dependency().optional()
    }

    fn extract(resolved: Option<&Instance>) -> Result<Self, InjectError> {
        match resolved {
            // Absent optional dependencies are not an error
            None => Ok(None),
            Some(_) => Injected::extract(resolved).map(Some),
        }
    }
}
