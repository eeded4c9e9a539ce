use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    condition::ConditionOneOf, point_id::PointIdOptions, r#match::MatchValue,
    vectors_config::Config as VectorsConfigInner, Condition, CreateCollectionBuilder, Distance,
    FieldCondition, Filter, Match, PointId, PointStruct, QueryPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder, VectorsConfig,
};
use qdrant_client::Qdrant;
use tracing::warn;
use wessley_core::{Context, Error, Result};
use wessley_domain::{SearchResult, VectorRecord};

use crate::payload::{search_result_from_payload, to_qdrant_payload};
use crate::VectorStore;

/// A Qdrant-backed implementation of [`VectorStore`] holding a single
/// long-lived gRPC connection (§5: "one connection, short-lived
/// operations").
pub struct QdrantVectorStore {
    client: Qdrant,
    collection_name: String,
}

impl QdrantVectorStore {
    pub fn connect(url: &str, collection_name: impl Into<String>) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| Error::Other(format!("connect qdrant: {e}")))?;
        Ok(Self {
            client,
            collection_name: collection_name.into(),
        })
    }
}

fn point_id_to_string(id: Option<PointId>) -> String {
    match id.and_then(|p| p.point_id_options) {
        Some(PointIdOptions::Uuid(s)) => s,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn ensure_collection(&self, ctx: &Context, dims: u64) -> Result<()> {
        ctx.check()?;
        let exists = self
            .client
            .collection_exists(&self.collection_name)
            .await
            .map_err(|e| Error::Other(format!("check collection exists: {e}")))?;
        if exists {
            return Ok(());
        }

        let vector_params = VectorParamsBuilder::new(dims, Distance::Cosine).build();
        let vectors_config = VectorsConfig {
            config: Some(VectorsConfigInner::Params(vector_params)),
        };
        let create = CreateCollectionBuilder::new(&self.collection_name).vectors_config(vectors_config);

        self.client
            .create_collection(create)
            .await
            .map_err(|e| Error::Other(format!("create collection: {e}")))?;
        Ok(())
    }

    async fn delete_collection(&self, ctx: &Context) -> Result<()> {
        ctx.check()?;
        self.client
            .delete_collection(&self.collection_name)
            .await
            .map_err(|e| Error::Other(format!("delete collection: {e}")))?;
        Ok(())
    }

    async fn upsert(&self, ctx: &Context, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        ctx.check()?;

        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let payload = to_qdrant_payload(&record.payload);
                PointStruct::new(record.id, record.embedding, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, points))
            .await
            .map_err(|e| Error::Other(format!("upsert points: {e}")))?;
        Ok(())
    }

    async fn delete_by_doc_id(&self, ctx: &Context, doc_id: &str) -> Result<()> {
        ctx.check()?;
        let filter = doc_id_filter(doc_id);
        self.client
            .delete_points(
                qdrant_client::qdrant::DeletePointsBuilder::new(&self.collection_name)
                    .points(filter),
            )
            .await
            .map_err(|e| Error::Other(format!("delete by doc_id: {e}")))?;
        Ok(())
    }

    async fn search(
        &self,
        ctx: &Context,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        self.search_filtered(ctx, query_embedding, top_k, HashMap::new()).await
    }

    async fn search_filtered(
        &self,
        ctx: &Context,
        query_embedding: &[f32],
        top_k: usize,
        filter: HashMap<String, String>,
    ) -> Result<Vec<SearchResult>> {
        ctx.check()?;

        let qdrant_filter = exact_match_filter(&filter);
        let query = QueryPointsBuilder::new(&self.collection_name)
            .query(query_embedding.to_vec())
            .limit(top_k as u64)
            .filter(qdrant_filter)
            .with_payload(true)
            .with_vectors(false);

        let response = self
            .client
            .query(query)
            .await
            .map_err(|e| Error::Other(format!("search: {e}")))?;

        let results = response
            .result
            .into_iter()
            .map(|point| {
                let id = point_id_to_string(point.id);
                let payload: HashMap<String, qdrant_client::qdrant::Value> =
                    point.payload.into_iter().collect();
                search_result_from_payload(id, point.score, payload)
            })
            .collect();

        Ok(results)
    }
}

fn doc_id_filter(doc_id: &str) -> Filter {
    Filter {
        must: vec![field_equals("doc_id", doc_id)],
        ..Default::default()
    }
}

fn exact_match_filter(filter: &HashMap<String, String>) -> Filter {
    if filter.is_empty() {
        warn!("search_filtered called with an empty filter map");
    }
    Filter {
        must: filter.iter().map(|(k, v)| field_equals(k, v)).collect(),
        ..Default::default()
    }
}

fn field_equals(key: &str, value: &str) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: key.to_string(),
            r#match: Some(Match {
                match_value: Some(MatchValue::Keyword(value.to_string())),
            }),
            ..Default::default()
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_id_extracts_uuid_variant() {
        let id = PointId {
            point_id_options: Some(PointIdOptions::Uuid("abc-123".into())),
        };
        assert_eq!(point_id_to_string(Some(id)), "abc-123");
    }

    #[test]
    fn point_id_missing_yields_empty_string() {
        assert_eq!(point_id_to_string(None), "");
    }

    #[test]
    fn exact_match_filter_builds_one_condition_per_key() {
        let mut map = HashMap::new();
        map.insert("vehicle".to_string(), "2019-Honda-Civic".to_string());
        let filter = exact_match_filter(&map);
        assert_eq!(filter.must.len(), 1);
    }

    #[test]
    fn doc_id_filter_matches_on_doc_id_field() {
        let filter = doc_id_filter("reddit:cars:abc123");
        assert_eq!(filter.must.len(), 1);
    }
}
