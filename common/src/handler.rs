//! [`Handler`] abstractions.

use std::future::Future;

/// Asynchronous executor of an `Args` operation.
///
/// Commands, queries and record-store requests are all expressed as
/// [`Handler`]s of the operation they perform, so the same component may be
/// backed by a real transport or by a test double.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes the `args` operation.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
