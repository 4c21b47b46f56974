//! Network-state oracle

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Online,
    Offline,
}

pub trait NetworkMonitor: Send + Sync {
    fn state(&self) -> NetworkState;

    fn is_online(&self) -> bool {
        self.state() == NetworkState::Online
    }
}

/// Fixed answer, for hosts that track connectivity elsewhere
#[derive(Debug, Clone, Copy)]
pub struct StaticNetwork(pub NetworkState);

impl Default for StaticNetwork {
    fn default() -> Self {
        Self(NetworkState::Online)
    }
}

impl NetworkMonitor for StaticNetwork {
    fn state(&self) -> NetworkState {
        self.0
    }
}
