//! Load state shared by every query

/// Lifecycle of a fetched value.
///
/// Data and error are mutually exclusive by construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadState<T> {
    /// No fetch issued yet
    #[default]
    Idle,
    /// A fetch is in flight
    Loading,
    /// Last fetch succeeded
    Ready(T),
    /// Last fetch failed with this message
    Failed(String),
}

impl<T> LoadState<T> {
    /// Whether a fetch is in flight
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Loaded data, if any
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Error message, if the last fetch failed
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Whether the state is terminal for the current input
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed(_))
    }

    /// Map the loaded data
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadState<U> {
        match self {
            Self::Idle => LoadState::Idle,
            Self::Loading => LoadState::Loading,
            Self::Ready(value) => LoadState::Ready(f(value)),
            Self::Failed(message) => LoadState::Failed(message),
        }
    }
}
