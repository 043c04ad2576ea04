//! Epoch-tagged state machine for refetched async resources.
//!
//! Branch lists and diff previews are re-requested whenever the settings
//! identity changes. Requests are not cancelled, so a slow earlier response
//! can arrive after a newer one; tagging each request with a monotonically
//! increasing epoch and discarding responses for a non-current epoch keeps
//! stale data from overwriting fresh state.

/// `Idle -> Loading(epoch) -> Ready(epoch, value) | Failed(epoch, error)`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Resource<T> {
    #[default]
    Idle,
    Loading {
        epoch: u64,
    },
    Ready {
        epoch: u64,
        value: T,
    },
    Failed {
        epoch: u64,
        error: String,
    },
}

impl<T> Resource<T> {
    /// Start a new request, invalidating all in-flight ones. Returns the
    /// epoch the response must present to `complete`.
    pub fn begin(&mut self) -> u64 {
        let epoch = self.epoch() + 1;
        *self = Resource::Loading { epoch };
        epoch
    }

    /// Deliver a response. Only the response for the in-flight epoch is
    /// accepted; stale and duplicate deliveries are discarded. Returns
    /// whether the response was accepted.
    pub fn complete(&mut self, epoch: u64, result: Result<T, String>) -> bool {
        if !matches!(self, Resource::Loading { epoch: current } if *current == epoch) {
            return false;
        }
        *self = match result {
            Ok(value) => Resource::Ready { epoch, value },
            Err(error) => Resource::Failed { epoch, error },
        };
        true
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Resource::Ready { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Resource::Loading { .. })
    }

    fn epoch(&self) -> u64 {
        match self {
            Resource::Idle => 0,
            Resource::Loading { epoch }
            | Resource::Ready { epoch, .. }
            | Resource::Failed { epoch, .. } => *epoch,
        }
    }
}
