//! Qdrant implementation of the vector store backend
//!
//! Maps collection lifecycle, batched upserts, and nearest-neighbor
//! queries onto the qdrant-client gRPC API. Document text and metadata
//! travel in the point payload under the `text` and `metadata` keys.

use async_trait::async_trait;
use docvec_core::{
    BackendConfig, CollectionInfo, CollectionStatus, Distance, DocvecError, Metadata, Result,
};
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    vectors_config, CollectionStatus as QdrantCollectionStatus, CreateCollectionBuilder,
    Distance as QdrantDistance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;

use super::{PointRecord, QueryMatch};

const PAYLOAD_TEXT_KEY: &str = "text";
const PAYLOAD_METADATA_KEY: &str = "metadata";

/// Qdrant vector store backend
pub struct QdrantBackend {
    client: Qdrant,
}

impl QdrantBackend {
    /// Connect to a Qdrant server
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut builder = Qdrant::from_url(&config.url);
        if let Some(key) = &config.api_key {
            builder = builder.api_key(key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| DocvecError::Backend(format!("Qdrant connection failed: {e}")))?;

        tracing::debug!(url = %config.url, "Connected to Qdrant");
        Ok(Self { client })
    }
}

fn to_qdrant_distance(distance: Distance) -> QdrantDistance {
    match distance {
        Distance::Cosine => QdrantDistance::Cosine,
        Distance::Dot => QdrantDistance::Dot,
        Distance::Euclid => QdrantDistance::Euclid,
    }
}

fn from_qdrant_distance(distance: i32) -> Distance {
    match QdrantDistance::try_from(distance) {
        Ok(QdrantDistance::Dot) => Distance::Dot,
        Ok(QdrantDistance::Euclid) => Distance::Euclid,
        _ => Distance::Cosine,
    }
}

/// Convert a qdrant payload value back into JSON
fn value_to_json(value: QdrantValue) -> serde_json::Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::from(i),
        Some(Kind::DoubleValue(d)) => serde_json::Value::from(d),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::StructValue(s)) => serde_json::Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
        Some(Kind::ListValue(l)) => {
            serde_json::Value::Array(l.values.into_iter().map(value_to_json).collect())
        }
    }
}

/// Build the point payload: `{"text": ..., "metadata": {...}}`
fn build_payload(text: Option<String>, metadata: Metadata) -> HashMap<String, QdrantValue> {
    let mut payload: HashMap<String, QdrantValue> = HashMap::new();

    if let Some(text) = text {
        payload.insert(
            PAYLOAD_TEXT_KEY.to_string(),
            serde_json::Value::String(text).into(),
        );
    }

    if !metadata.is_empty() {
        let metadata_value = serde_json::Value::Object(metadata.into_iter().collect());
        payload.insert(PAYLOAD_METADATA_KEY.to_string(), metadata_value.into());
    }

    payload
}

/// Split a point payload back into text and metadata
fn split_payload(mut payload: HashMap<String, QdrantValue>) -> (Option<String>, Metadata) {
    let text = payload
        .remove(PAYLOAD_TEXT_KEY)
        .map(value_to_json)
        .and_then(|v| v.as_str().map(|s| s.to_string()));

    let metadata = payload
        .remove(PAYLOAD_METADATA_KEY)
        .map(value_to_json)
        .and_then(|v| match v {
            serde_json::Value::Object(map) => Some(map.into_iter().collect()),
            _ => None,
        })
        .unwrap_or_default();

    (text, metadata)
}

#[async_trait]
impl super::VectorBackend for QdrantBackend {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| DocvecError::Backend(format!("Failed to list collections: {e}")))?;

        Ok(response
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(name).vectors_config(VectorParamsBuilder::new(
                    dimension as u64,
                    to_qdrant_distance(distance),
                )),
            )
            .await
            .map_err(|e| DocvecError::Backend(format!("Failed to create collection: {e}")))?;

        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.client
            .delete_collection(name)
            .await
            .map_err(|e| DocvecError::Backend(format!("Failed to delete collection: {e}")))?;

        Ok(())
    }

    async fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>> {
        let response = match self.client.collection_info(name).await {
            Ok(response) => response,
            // The gRPC API reports a missing collection as an error; the
            // caller decides whether absence is exceptional.
            Err(_) => return Ok(None),
        };

        let Some(info) = response.result else {
            return Ok(None);
        };

        let status = match QdrantCollectionStatus::try_from(info.status) {
            Ok(QdrantCollectionStatus::Green) => CollectionStatus::Green,
            Ok(QdrantCollectionStatus::Yellow) => CollectionStatus::Yellow,
            Ok(QdrantCollectionStatus::Red) => CollectionStatus::Red,
            _ => CollectionStatus::Unknown,
        };

        let (dimension, distance) = info
            .config
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .map(|c| match c {
                vectors_config::Config::Params(params) => (
                    params.size as usize,
                    from_qdrant_distance(params.distance),
                ),
                vectors_config::Config::ParamsMap(_) => (0, Distance::Cosine),
            })
            .unwrap_or((0, Distance::Cosine));

        Ok(Some(CollectionInfo {
            name: name.to_string(),
            dimension,
            distance,
            points_count: info.points_count.unwrap_or(0),
            status,
        }))
    }

    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> Result<()> {
        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|record| {
                PointStruct::new(
                    record.id,
                    record.vector,
                    build_payload(record.text, record.metadata),
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points))
            .await
            .map_err(|e| DocvecError::Backend(format!("Failed to upsert points: {e}")))?;

        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<QueryMatch>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| DocvecError::Backend(format!("Vector query failed: {e}")))?;

        let matches = response
            .result
            .into_iter()
            .map(|point| {
                let id = point
                    .id
                    .and_then(|id| id.point_id_options)
                    .map(|options| match options {
                        PointIdOptions::Uuid(uuid) => uuid,
                        PointIdOptions::Num(num) => num.to_string(),
                    })
                    .unwrap_or_default();

                let (text, metadata) = split_payload(point.payload);

                QueryMatch {
                    id,
                    score: point.score,
                    text,
                    metadata,
                }
            })
            .collect();

        Ok(matches)
    }
}
