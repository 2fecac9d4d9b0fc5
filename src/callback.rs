//! Shared callbacks passed through props

use std::fmt;
use std::sync::Arc;

/// A callback function that can be passed as a prop
pub struct Callback<Args, Ret = ()> {
    func: Arc<dyn Fn(Args) -> Ret + Send + Sync>,
}

impl<Args, Ret> Clone for Callback<Args, Ret> {
    fn clone(&self) -> Self {
        Self {
            func: self.func.clone(),
        }
    }
}

impl<Args, Ret> fmt::Debug for Callback<Args, Ret> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("func", &format!("{:p}", Arc::as_ptr(&self.func)))
            .finish()
    }
}

impl<Args, Ret> Callback<Args, Ret> {
    /// Create a new callback
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Args) -> Ret + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// Call the callback with the given arguments
    pub fn call(&self, args: Args) -> Ret {
        (self.func)(args)
    }

    /// Whether two callbacks share the same underlying closure
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

/// Convenience function for creating a callback
pub fn callback<F, Args, Ret>(func: F) -> Callback<Args, Ret>
where
    F: Fn(Args) -> Ret + Send + Sync + 'static,
{
    Callback::new(func)
}
