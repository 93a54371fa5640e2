//! Query-capable GPU context abstraction

/// A rendering context able to time GPU work with asynchronous queries
///
/// Modelled on disjoint timer queries: a query brackets a stretch of the command
/// stream, and its elapsed time becomes readable some frames later. None of these
/// calls may block waiting for the GPU.
pub trait TimerQueryContext {
    /// Opaque query handle
    type Query;

    /// Whether this context can time GPU work at all
    fn supports_timer_queries(&self) -> bool;

    /// Allocate a query object, `None` if the context refuses
    fn create_query(&mut self) -> Option<Self::Query>;

    /// Start timing into `query`
    fn begin_query(&mut self, query: &Self::Query);

    /// Stop timing into `query`
    fn end_query(&mut self, query: &Self::Query);

    /// Whether the result of `query` can be read without stalling
    fn is_result_available(&mut self, query: &Self::Query) -> bool;

    /// Whether the GPU clock was discontinuous since the last check
    fn is_disjoint(&mut self) -> bool;

    /// Elapsed GPU time of a completed query, in nanoseconds
    fn query_result_ns(&mut self, query: &Self::Query) -> u64;

    /// Release a query object
    fn delete_query(&mut self, query: Self::Query);
}

/// A context without timer-query support
///
/// Engines bound to it, or to nothing, measure CPU time only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullContext;

impl TimerQueryContext for NullContext {
    type Query = ();

    fn supports_timer_queries(&self) -> bool {
        false
    }

    fn create_query(&mut self) -> Option<()> {
        None
    }

    fn begin_query(&mut self, _query: &()) {}

    fn end_query(&mut self, _query: &()) {}

    fn is_result_available(&mut self, _query: &()) -> bool {
        false
    }

    fn is_disjoint(&mut self) -> bool {
        false
    }

    fn query_result_ns(&mut self, _query: &()) -> u64 {
        0
    }

    fn delete_query(&mut self, _query: ()) {}
}
