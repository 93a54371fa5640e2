//! What an overlay can be bound to

use tempo_core::Result;
use tempo_timing::TimerQueryContext;

/// Something a timer-query context can be obtained from: a drawable surface,
/// an adapter, or a renderer that owns a device
pub trait ContextSource {
    type Context: TimerQueryContext;

    /// Produce the context, or explain why none is available
    fn acquire_context(&mut self) -> Result<Self::Context>;
}

/// The thing handed to `Stats::init`
pub enum InitTarget<S: ContextSource> {
    /// An existing query-capable context
    Context(S::Context),
    /// A drawable surface to obtain a context from
    Surface(S),
    /// A renderer; its draw calls are bracketed with `Stats::instrument`
    Renderer(S),
}

impl<S: ContextSource> InitTarget<S> {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Context(_) => "context",
            Self::Surface(_) => "surface",
            Self::Renderer(_) => "renderer",
        }
    }
}

impl<C: TimerQueryContext> InitTarget<ReadyContext<C>> {
    /// Bind an already-created context
    pub fn context(context: C) -> Self {
        Self::Context(context)
    }
}

/// A source wrapping a context that already exists; yields it once
pub struct ReadyContext<C>(Option<C>);

impl<C> ReadyContext<C> {
    pub fn new(context: C) -> Self {
        Self(Some(context))
    }
}

impl<C: TimerQueryContext> ContextSource for ReadyContext<C> {
    type Context = C;

    fn acquire_context(&mut self) -> Result<C> {
        self.0.take().ok_or_else(|| {
            tempo_core::TempoError::ContextUnavailable("context was already taken".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_timing::NullContext;

    #[test]
    fn test_ready_context_yields_once() {
        let mut source = ReadyContext::new(NullContext);
        assert!(source.acquire_context().is_ok());
        assert!(source.acquire_context().is_err());
    }

    #[test]
    fn test_describe() {
        let target = InitTarget::context(NullContext);
        assert_eq!(target.describe(), "context");
        let target: InitTarget<ReadyContext<NullContext>> =
            InitTarget::Renderer(ReadyContext::new(NullContext));
        assert_eq!(target.describe(), "renderer");
    }
}
