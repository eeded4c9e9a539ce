//! Neo4j-backed graph store adapter (C7, §4.7).

mod neo4j;
mod sanitize;

pub use neo4j::Neo4jGraphStore;
pub use sanitize::{sanitize_prop_key, sanitize_rel_type};

use async_trait::async_trait;
use wessley_core::{Context, Result};
use wessley_domain::{ComponentNode, Edge, VehicleInfo};

/// The graph-store contract every adapter implements (§4.7). Every
/// operation is idempotent and every relationship type is passed through
/// [`sanitize_rel_type`] before it reaches a query.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn save_component(&self, ctx: &Context, component: &ComponentNode) -> Result<()>;

    async fn save_edge(&self, ctx: &Context, edge: &Edge) -> Result<()>;

    /// Creates/merges Make→Model→Year→Trim nodes and edges; a no-op if the
    /// chain already exists.
    async fn ensure_vehicle_hierarchy(&self, ctx: &Context, vehicle_info: &VehicleInfo) -> Result<()>;

    async fn find_by_type(&self, ctx: &Context, node_type: &str) -> Result<Vec<ComponentNode>>;

    /// Variable-length path of depth `[1..max(1,depth)]`.
    async fn neighbors(&self, ctx: &Context, id: &str, depth: u32) -> Result<Vec<ComponentNode>>;

    /// Shortest path between two components; `Err` if none exists.
    async fn trace_path(&self, ctx: &Context, from_id: &str, to_id: &str) -> Result<Vec<ComponentNode>>;

    /// Persists `components` and `edges` in a single transaction.
    async fn save_batch(&self, ctx: &Context, components: &[ComponentNode], edges: &[Edge]) -> Result<()>;
}
