use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use neo4rs::{Graph, Query};
use wessley_core::{Context, Error, Result};
use wessley_domain::{ComponentNode, Edge, VehicleInfo};

use crate::sanitize::{sanitize_prop_key, sanitize_rel_type};
use crate::GraphStore;

/// Holds a single long-lived driver; each operation opens and closes its
/// own session (§4.7, §5).
pub struct Neo4jGraphStore {
    graph: Arc<Graph>,
}

impl Neo4jGraphStore {
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .map_err(|e| Error::Other(format!("connect neo4j: {e}")))?;
        Ok(Self { graph: Arc::new(graph) })
    }

    async fn run(&self, ctx: &Context, query: Query) -> Result<()> {
        ctx.check()?;
        self.graph
            .run(query)
            .await
            .map_err(|e| Error::Other(format!("neo4j run: {e}")))
    }

    fn component_from_row(row: &neo4rs::Row) -> Option<ComponentNode> {
        let id: String = row.get("id").ok()?;
        let name: String = row.get("name").unwrap_or_default();
        let node_type: String = row.get("type").unwrap_or_default();
        let vehicle: Option<String> = row.get("vehicle").ok();
        Some(ComponentNode {
            id,
            name,
            node_type,
            vehicle,
            properties: HashMap::new(),
        })
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn save_component(&self, ctx: &Context, component: &ComponentNode) -> Result<()> {
        let query = Query::new(
            "MERGE (c:Component {id: $id}) \
             SET c.name = $name, c.type = $node_type, c.vehicle = $vehicle"
                .to_string(),
        )
        .param("id", component.id.clone())
        .param("name", component.name.clone())
        .param("node_type", component.node_type.clone())
        .param("vehicle", component.vehicle.clone().unwrap_or_default());
        self.run(ctx, query).await?;

        for (key, value) in &component.properties {
            let prop_key = format!("prop_{}", sanitize_prop_key(key));
            let cypher = format!("MATCH (c:Component {{id: $id}}) SET c.{prop_key} = $value");
            let query = Query::new(cypher).param("id", component.id.clone()).param("value", value.clone());
            self.run(ctx, query).await?;
        }
        Ok(())
    }

    async fn save_edge(&self, ctx: &Context, edge: &Edge) -> Result<()> {
        let rel_type = sanitize_rel_type(&edge.edge_type);
        let cypher = format!(
            "MATCH (a:Component {{id: $from_id}}), (b:Component {{id: $to_id}}) \
             MERGE (a)-[:{rel_type}]->(b)"
        );
        let query = Query::new(cypher)
            .param("from_id", edge.from_id.clone())
            .param("to_id", edge.to_id.clone());
        self.run(ctx, query).await
    }

    async fn ensure_vehicle_hierarchy(&self, ctx: &Context, vehicle_info: &VehicleInfo) -> Result<()> {
        let (Some(make), Some(model), Some(year)) =
            (&vehicle_info.make, &vehicle_info.model, vehicle_info.year)
        else {
            return Ok(());
        };

        let mut cypher = String::from(
            "MERGE (make:Make {name: $make}) \
             MERGE (model:Model {make: $make, name: $model}) \
             MERGE (make)-[:HAS_MODEL]->(model) \
             MERGE (year:Year {make: $make, model: $model, year: $year}) \
             MERGE (model)-[:HAS_YEAR]->(year)",
        );
        let query = if let Some(trim) = &vehicle_info.trim {
            cypher.push_str(
                " MERGE (trim:Trim {make: $make, model: $model, year: $year, name: $trim}) \
                  MERGE (year)-[:HAS_TRIM]->(trim)",
            );
            Query::new(cypher)
                .param("make", make.clone())
                .param("model", model.clone())
                .param("year", year as i64)
                .param("trim", trim.clone())
        } else {
            Query::new(cypher)
                .param("make", make.clone())
                .param("model", model.clone())
                .param("year", year as i64)
        };
        self.run(ctx, query).await
    }

    async fn find_by_type(&self, ctx: &Context, node_type: &str) -> Result<Vec<ComponentNode>> {
        ctx.check()?;
        let query = Query::new(
            "MATCH (c:Component) WHERE c.type = $node_type \
             RETURN c.id AS id, c.name AS name, c.type AS type, c.vehicle AS vehicle"
                .to_string(),
        )
        .param("node_type", node_type.to_string());

        let mut result = self
            .graph
            .execute(query)
            .await
            .map_err(|e| Error::Other(format!("find_by_type: {e}")))?;

        let mut nodes = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| Error::Other(format!("find_by_type row: {e}")))?
        {
            if let Some(node) = Self::component_from_row(&row) {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    async fn neighbors(&self, ctx: &Context, id: &str, depth: u32) -> Result<Vec<ComponentNode>> {
        ctx.check()?;
        let bound = depth.max(1);
        let cypher = format!(
            "MATCH (c:Component {{id: $id}})-[*1..{bound}]-(n:Component) \
             RETURN DISTINCT n.id AS id, n.name AS name, n.type AS type, n.vehicle AS vehicle"
        );
        let query = Query::new(cypher).param("id", id.to_string());

        let mut result = self
            .graph
            .execute(query)
            .await
            .map_err(|e| Error::Other(format!("neighbors: {e}")))?;

        let mut nodes = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| Error::Other(format!("neighbors row: {e}")))?
        {
            if let Some(node) = Self::component_from_row(&row) {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    async fn trace_path(&self, ctx: &Context, from_id: &str, to_id: &str) -> Result<Vec<ComponentNode>> {
        ctx.check()?;
        let query = Query::new(
            "MATCH p = shortestPath((a:Component {id: $from_id})-[*]-(b:Component {id: $to_id})) \
             UNWIND nodes(p) AS n \
             RETURN n.id AS id, n.name AS name, n.type AS type, n.vehicle AS vehicle"
                .to_string(),
        )
        .param("from_id", from_id.to_string())
        .param("to_id", to_id.to_string());

        let mut result = self
            .graph
            .execute(query)
            .await
            .map_err(|e| Error::Other(format!("trace_path: {e}")))?;

        let mut nodes = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| Error::Other(format!("trace_path row: {e}")))?
        {
            if let Some(node) = Self::component_from_row(&row) {
                nodes.push(node);
            }
        }

        if nodes.is_empty() {
            return Err(Error::Other(format!("no path from {from_id} to {to_id}")));
        }
        Ok(nodes)
    }

    async fn save_batch(&self, ctx: &Context, components: &[ComponentNode], edges: &[Edge]) -> Result<()> {
        ctx.check()?;
        let mut txn = self
            .graph
            .start_txn()
            .await
            .map_err(|e| Error::Other(format!("start transaction: {e}")))?;

        for component in components {
            let query = Query::new(
                "MERGE (c:Component {id: $id}) SET c.name = $name, c.type = $node_type, c.vehicle = $vehicle"
                    .to_string(),
            )
            .param("id", component.id.clone())
            .param("name", component.name.clone())
            .param("node_type", component.node_type.clone())
            .param("vehicle", component.vehicle.clone().unwrap_or_default());
            txn.run(query)
                .await
                .map_err(|e| Error::Other(format!("save_batch component: {e}")))?;
        }

        for edge in edges {
            let rel_type = sanitize_rel_type(&edge.edge_type);
            let cypher = format!(
                "MATCH (a:Component {{id: $from_id}}), (b:Component {{id: $to_id}}) MERGE (a)-[:{rel_type}]->(b)"
            );
            let query = Query::new(cypher)
                .param("from_id", edge.from_id.clone())
                .param("to_id", edge.to_id.clone());
            txn.run(query)
                .await
                .map_err(|e| Error::Other(format!("save_batch edge: {e}")))?;
        }

        txn.commit()
            .await
            .map_err(|e| Error::Other(format!("commit transaction: {e}")))
    }
}
