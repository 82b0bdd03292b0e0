use std::fmt::Debug;
use std::sync::Arc;

pub use subkit::FutureResult;

/// Providers implement [`CodeStore`] to hold issued codes until they are
/// answered or expire.
pub trait CodeStore: Debug + Send + Sync + 'static {
    /// Store `code` under `id`, replacing any previous code.
    fn set(&self, id: String, code: String) -> FutureResult<()>;

    /// The code stored under `id`, or `None` when missing or expired.
    fn get(&self, id: String) -> FutureResult<Option<String>>;

    /// Remove the code stored under `id`. Removing a missing id is not an error.
    fn delete(&self, id: String) -> FutureResult<()>;
}

impl<T: CodeStore + ?Sized> CodeStore for Arc<T> {
    fn set(&self, id: String, code: String) -> FutureResult<()> {
        (**self).set(id, code)
    }

    fn get(&self, id: String) -> FutureResult<Option<String>> {
        (**self).get(id)
    }

    fn delete(&self, id: String) -> FutureResult<()> {
        (**self).delete(id)
    }
}
