//! Owned handles to the weight store and the shared table.

use std::sync::Arc;

use crate::config::{CoreConfig, TtConfig};
use crate::error::NetworkError;
use crate::nnue::{EvalContext, Network, Placement};
use crate::tt::TranspositionTable;

/// The process-wide pieces of the core, built once and passed down the
/// search call graph.
#[derive(Clone, Debug)]
pub struct Core {
    network: Arc<Network>,
    tt: Arc<TranspositionTable>,
}

impl Core {
    /// Load the network and allocate the table.
    ///
    /// # Errors
    /// Fails before anything is allocated if the network cannot be loaded.
    pub fn new(config: &CoreConfig) -> Result<Self, NetworkError> {
        let network = match &config.network_path {
            Some(path) => Arc::new(Network::load(path)?),
            None => default_network()?,
        };
        Ok(Self::with_network(network, &config.tt))
    }

    #[must_use]
    pub fn with_network(network: Arc<Network>, tt: &TtConfig) -> Self {
        Self {
            network,
            tt: Arc::new(TranspositionTable::from_config(tt)),
        }
    }

    #[must_use]
    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }

    #[must_use]
    pub fn tt(&self) -> &Arc<TranspositionTable> {
        &self.tt
    }

    /// Fresh evaluation context for a position, built by replaying its pieces.
    #[must_use]
    pub fn eval_context<I>(&self, pieces: I) -> EvalContext
    where
        I: IntoIterator,
        I::Item: Into<Placement>,
    {
        EvalContext::from_pieces(Arc::clone(&self.network), pieces)
    }

    /// Game reset hook: empties the table and starts a new generation.
    /// Evaluation contexts must be rebuilt with [`Core::eval_context`].
    pub fn new_game(&self) {
        self.tt.new_game();
    }
}

#[cfg(feature = "embedded_nnue")]
fn default_network() -> Result<Arc<Network>, NetworkError> {
    Network::embedded()
}

#[cfg(not(feature = "embedded_nnue"))]
fn default_network() -> Result<Arc<Network>, NetworkError> {
    log::error!("no network path configured and no embedded network compiled in");
    Err(NetworkError::Missing)
}
