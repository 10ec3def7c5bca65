//! Topology service - translates request bodies into guard calls
//!
//! Response shapes and status strings match the wire format existing router
//! clients already speak: mutation endpoints answer `{"status": ...}` and
//! recoverable failures are reported in that field rather than as HTTP errors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use topology::{
    ConsistencyGuard, Hop, InvariantViolation, LinkChange, LinkStatus, PathResult,
    TopologyError, UNREACHABLE_WEIGHT,
};

/// Outcome of a mutation as reported on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "updated")]
    Updated,
    #[serde(rename = "Error, node already exists")]
    AlreadyExists,
    #[serde(rename = "Error, router does not exist")]
    RouterMissing,
    #[serde(rename = "Error, invalid weight")]
    InvalidWeight,
    #[serde(rename = "Error, cannot connect a router to itself")]
    SelfLink,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: Status,
}

impl From<Status> for StatusResponse {
    fn from(status: Status) -> Self {
        Self { status }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectRequest {
    pub from: String,
    pub to: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionRequest {
    pub from: String,
    pub to: String,
}

/// Largest magnitude at which every whole `f64` is an exact integer (2^53)
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Whole-number weights go out as JSON integers (`7`, `-1`), others as floats
fn serialize_weight<S: Serializer>(weight: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if weight.fract() == 0.0 && weight.abs() <= EXACT_INTEGER_LIMIT {
        serializer.serialize_i64(*weight as i64)
    } else {
        serializer.serialize_f64(*weight)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteHop {
    pub from: String,
    pub to: String,
    #[serde(serialize_with = "serialize_weight")]
    pub weight: f64,
}

impl From<Hop> for RouteHop {
    fn from(hop: Hop) -> Self {
        Self {
            from: hop.from,
            to: hop.to,
            weight: hop.weight,
        }
    }
}

/// A route entry is a traversed link, or the lone router of a self query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteEntry {
    Hop(RouteHop),
    Router(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub from: String,
    pub to: String,
    #[serde(serialize_with = "serialize_weight")]
    pub weight: f64,
    pub route: Vec<RouteEntry>,
}

impl From<PathResult> for RouteResponse {
    fn from(path: PathResult) -> Self {
        let weight = path.weight();
        let route = if path.is_reachable() && path.hops.is_empty() {
            path.nodes.into_iter().map(RouteEntry::Router).collect()
        } else {
            path.hops
                .into_iter()
                .map(|hop| RouteEntry::Hop(hop.into()))
                .collect()
        };

        Self {
            from: path.from,
            to: path.to,
            weight,
            route,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterList {
    pub routers: Vec<String>,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub routers: usize,
    pub links: usize,
    pub version: u64,
    pub violations: Vec<InvariantViolation>,
}

#[derive(Clone, Default)]
pub struct TopologyService {
    guard: ConsistencyGuard,
}

impl TopologyService {
    pub fn new(guard: ConsistencyGuard) -> Self {
        Self { guard }
    }

    pub async fn add_router(&self, request: RouterRequest) -> Result<StatusResponse, TopologyError> {
        match self.guard.add_node(request.name.clone()).await {
            Ok(()) => {
                tracing::info!(router = %request.name, "router added");
                Ok(Status::Success.into())
            }
            Err(TopologyError::AlreadyExists(_)) => Ok(Status::AlreadyExists.into()),
            Err(err) => Err(err),
        }
    }

    pub async fn connect(&self, request: ConnectRequest) -> Result<StatusResponse, TopologyError> {
        let result = self
            .guard
            .add_or_update_link(&request.from, &request.to, request.weight)
            .await;

        match result {
            Ok(change) => {
                tracing::info!(
                    from = %request.from,
                    to = %request.to,
                    weight = request.weight,
                    ?change,
                    "link written"
                );
                Ok(match change {
                    LinkChange::Created => Status::Success,
                    LinkChange::Updated => Status::Updated,
                }
                .into())
            }
            Err(err) => {
                let status = Self::rejection(&err).ok_or(err.clone())?;
                tracing::warn!(from = %request.from, to = %request.to, "connect rejected: {}", err);
                Ok(status.into())
            }
        }
    }

    pub async fn remove_router(&self, request: RouterRequest) -> StatusResponse {
        if self.guard.remove_node(&request.name).await {
            tracing::info!(router = %request.name, "router removed");
        }
        Status::Success.into()
    }

    pub async fn remove_connection(&self, request: ConnectionRequest) -> StatusResponse {
        if self.guard.remove_link(&request.from, &request.to).await {
            tracing::info!(from = %request.from, to = %request.to, "link removed");
        }
        Status::Success.into()
    }

    /// Unknown routers get the same answer as an unreachable destination
    pub async fn route(&self, request: ConnectionRequest) -> Result<RouteResponse, TopologyError> {
        match self.guard.shortest_path(&request.from, &request.to).await {
            Ok(path) => Ok(path.into()),
            Err(TopologyError::UnknownNode(_)) => Ok(RouteResponse {
                from: request.from,
                to: request.to,
                weight: UNREACHABLE_WEIGHT,
                route: Vec::new(),
            }),
            Err(err) => Err(err),
        }
    }

    /// What `connect` would answer, without writing anything
    pub async fn connection_status(
        &self,
        request: ConnectionRequest,
    ) -> Result<StatusResponse, TopologyError> {
        match self.guard.status_of_link(&request.from, &request.to).await {
            Ok(LinkStatus::WouldCreate) => Ok(Status::Success.into()),
            Ok(LinkStatus::WouldUpdate) => Ok(Status::Updated.into()),
            Err(err) => Self::rejection(&err).map(StatusResponse::from).ok_or(err),
        }
    }

    pub async fn list_routers(&self) -> RouterList {
        let snapshot = self.guard.snapshot().await;
        RouterList {
            routers: snapshot.list_nodes(),
            version: snapshot.version(),
        }
    }

    pub async fn neighbors(&self, name: &str) -> Result<IndexMap<String, f64>, TopologyError> {
        self.guard.neighbors_of(name).await
    }

    pub async fn distances(&self, name: &str) -> Result<IndexMap<String, f64>, TopologyError> {
        self.guard.distances_from(name).await
    }

    pub async fn health(&self) -> HealthReport {
        let snapshot = self.guard.snapshot().await;
        let violations = topology::InvariantChecker::new().check_all(&snapshot);
        let status = if violations.is_empty() { "ok" } else { "degraded" };

        HealthReport {
            status: status.to_string(),
            routers: snapshot.node_count(),
            links: snapshot.link_count(),
            version: snapshot.version(),
            violations,
        }
    }

    /// Wire status for a recoverable error; `None` for corruption
    fn rejection(err: &TopologyError) -> Option<Status> {
        match err {
            TopologyError::AlreadyExists(_) => Some(Status::AlreadyExists),
            TopologyError::UnknownNode(_) => Some(Status::RouterMissing),
            TopologyError::InvalidWeight(_) => Some(Status::InvalidWeight),
            TopologyError::SelfLink(_) => Some(Status::SelfLink),
            TopologyError::InvariantViolation(_) => None,
        }
    }
}
