use std::{
    any::{Any, TypeId},
    fmt::Debug,
    sync::Arc,
};

/// All errors raised by factories, hooks and advice
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Components may be shared between threads
/// So anything injectable needs to be Send + Sync + 'static
///
/// Also implemented for unsized capability types like `dyn MyService`.
pub trait Injectable: Send + Sync + 'static {}
impl<T: ?Sized + Send + Sync + 'static> Injectable for T {}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// A type erased, shared component instance
///
/// Holds an `Arc<T>` where `T` is the type in `info`, so unsized capabilities
/// (`Arc<dyn Trait>`) can be stored next to concrete types.
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    instance: Arc<dyn Any + Send + Sync + 'static>,
    address: usize,
}
impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instance").field(&self.info.type_name).finish()
    }
}

impl Instance {
    pub fn from_arc<T: ?Sized + Injectable>(instance: Arc<T>) -> Self {
        let address = Arc::as_ptr(&instance) as *const () as usize;
        Instance {
            info: TypeInfo::of::<T>(),
            instance: Arc::new(instance),
            address,
        }
    }

    pub fn new<T: Injectable>(instance: T) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    /// Returns the stored `Arc<T>`, or the actual type name on mismatch
    pub fn downcast<T: ?Sized + Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match self.instance.downcast_ref::<Arc<T>>() {
            Some(downcasted) => Ok(downcasted.clone()),
            None => Err(self.info.type_name),
        }
    }

    /// Address of the shared value, equal for all views of the same allocation
    pub fn address(&self) -> usize {
        self.address
    }

    /// True if both instances point to the same allocation
    pub fn same_as(&self, other: &Instance) -> bool {
        self.address == other.address
    }
}

/// Anything that can travel through an advice chain as an argument or a result
pub trait Payload: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    fn payload_type(&self) -> &'static str;
}
impl<T: Any + Debug + Send + Sync> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn payload_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Immutable, cheaply clonable value passed to advice
#[derive(Clone)]
pub struct Value(Arc<dyn Payload>);

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

impl Value {
    pub fn new<T: Payload>(value: T) -> Self {
        Value(Arc::new(value))
    }

    /// The value returned by methods without a result
    pub fn unit() -> Self {
        Value::new(())
    }

    pub fn type_name(&self) -> &'static str {
        (*self.0).payload_type()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref::<T>()
    }

    /// Takes the value out, cloning only if it is still shared
    pub fn take<T: Payload + Clone>(self) -> Result<T, Value> {
        match Payload::into_any(Arc::clone(&self.0)).downcast::<T>() {
            Ok(value) => {
                drop(self);
                Ok(Arc::try_unwrap(value).unwrap_or_else(|shared| (*shared).clone()))
            }
            Err(_) => Err(self),
        }
    }
}
