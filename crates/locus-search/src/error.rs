use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// A newer call on the same stream arrived within the debounce window,
    /// or overtook this one while it was in flight.
    #[error("search superseded by a newer query")]
    Superseded,
}
