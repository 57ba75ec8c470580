/// The two, and only two, conditions that cross the queue boundary.
///
/// Every other hazard (contended CAS, tail lag, ABA avoidance) is handled
/// internally by the retry protocol and is never observable here.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue empty")]
    Empty,
    #[error("Out of memory")]
    NoMem,
}
