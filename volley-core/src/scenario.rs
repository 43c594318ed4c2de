use std::future::Future;
use std::pin::Pin;

use super::context::IterationContext;
use super::iteration::IterationOutput;

pub type ScenarioFuture = Pin<Box<dyn Future<Output = IterationOutput> + Send + 'static>>;

/// User logic executed once per VU iteration.
///
/// Implemented for any `Fn(IterationContext) -> impl Future<Output = IterationOutput>`
/// closure, so a scenario is usually written as
///
/// ```ignore
/// let scenario = |mut ctx: IterationContext| async move {
///     match ctx.http_get("http://localhost:8000/api/tracks/").await {
///         Ok(res) => {
///             ctx.check(&res, "status is 200", |r| r.status == 200);
///             ctx.success()
///         }
///         Err(err) => ctx.failure(err.transport_error_kind().to_string()),
///     }
/// };
/// ```
pub trait Scenario: Send + Sync + 'static {
    fn iteration(&self, ctx: IterationContext) -> ScenarioFuture;
}

impl<F, Fut> Scenario for F
where
    F: Fn(IterationContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = IterationOutput> + Send + 'static,
{
    fn iteration(&self, ctx: IterationContext) -> ScenarioFuture {
        Box::pin(self(ctx))
    }
}
