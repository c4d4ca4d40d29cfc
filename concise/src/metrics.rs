//! Opt-in call counters. The engine itself never owns global mutable state;
//! a host that wants call counts supplies an implementation of this trait
//! and wires it in via [`crate::ConciseSet::with_metrics`].

pub trait MergeMetrics: Send + Sync {
    fn on_intersection(&self) {}
    fn on_union(&self) {}
    fn on_difference(&self) {}
    fn on_symmetric_difference(&self) {}
    fn on_add(&self, _changed: bool) {}
    fn on_remove(&self, _changed: bool) {}
}
