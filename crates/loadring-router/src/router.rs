//! Algorithm-agnostic facade over the four mappers.

use tracing::debug;

use crate::chbl::{CapacityStatus, ChblMapper};
use crate::error::RouterError;
use crate::jump::JumpMapper;
use crate::maglev::MaglevMapper;
use crate::mapper::Mapper;
use crate::options::{Algorithm, Options};
use crate::ring_mapper::RingMapper;

/// A mapper chosen at runtime by [`Algorithm`].
///
/// Every call forwards to the selected implementation; the router adds no
/// state of its own.
pub enum Router {
    /// Plain consistent hashing over a vnode ring.
    Ring(RingMapper),
    /// Jump consistent hashing over an ordered node list.
    Jump(JumpMapper),
    /// Maglev permutation table.
    Maglev(MaglevMapper),
    /// Consistent hashing with bounded loads.
    Chbl(ChblMapper),
}

impl Router {
    /// Build a router for `algorithm` over the initial `nodes`.
    pub fn new<S: AsRef<str>>(
        algorithm: Algorithm,
        options: &Options,
        nodes: &[S],
    ) -> Result<Self, RouterError> {
        let router = match algorithm {
            Algorithm::Ring => Self::Ring(RingMapper::new(nodes, options)?),
            Algorithm::Jump => Self::Jump(JumpMapper::new(nodes, options)),
            Algorithm::Maglev => Self::Maglev(MaglevMapper::new(nodes, options)?),
            Algorithm::Chbl => Self::Chbl(ChblMapper::new(nodes, options)?),
        };
        debug!(%algorithm, nodes = nodes.len(), "router created");
        Ok(router)
    }

    /// Like [`Router::new`], selecting the algorithm by name
    /// (`ring`, `jump`, `maglev` or `chbl`, case-insensitive).
    pub fn from_name<S: AsRef<str>>(
        name: &str,
        options: &Options,
        nodes: &[S],
    ) -> Result<Self, RouterError> {
        Self::new(name.parse()?, options, nodes)
    }

    fn inner(&self) -> &dyn Mapper {
        match self {
            Self::Ring(m) => m,
            Self::Jump(m) => m,
            Self::Maglev(m) => m,
            Self::Chbl(m) => m,
        }
    }
}

impl Mapper for Router {
    fn add(&self, nodes: &[&str]) {
        self.inner().add(nodes)
    }

    fn remove(&self, nodes: &[&str]) {
        self.inner().remove(nodes)
    }

    fn pick(&self, key: &[u8]) -> Result<String, RouterError> {
        self.inner().pick(key)
    }

    fn nodes(&self) -> Vec<String> {
        self.inner().nodes()
    }

    fn algorithm(&self) -> Algorithm {
        self.inner().algorithm()
    }

    fn capacity_status(&self) -> Option<CapacityStatus> {
        self.inner().capacity_status()
    }
}
