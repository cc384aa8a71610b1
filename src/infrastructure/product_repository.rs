/// DynamoDBのProductsテーブルに商品エンティティを登録するためのリポジトリ
///
/// テーブルはPartitionKey（HASH）+ RowKey（RANGE）の複合キーで構成する。
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::ProductEntity;

/// パーティションキーの属性名
pub const PARTITION_KEY_ATTRIBUTE: &str = "PartitionKey";

/// 行キーの属性名
pub const ROW_KEY_ATTRIBUTE: &str = "RowKey";

/// 同一キーのエンティティが存在しない場合のみ書き込む条件式
const INSERT_CONDITION: &str =
    "attribute_not_exists(PartitionKey) AND attribute_not_exists(RowKey)";

/// テーブルがACTIVEになるまでのポーリング間隔
const TABLE_ACTIVE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// テーブルがACTIVEになるまでの最大ポーリング回数
const TABLE_ACTIVE_MAX_ATTEMPTS: u32 = 60;

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// 同じPartitionKey+RowKeyのエンティティが既に存在
    #[error("Entity already exists: PartitionKey={partition_key}, RowKey={row_key}")]
    DuplicateKey {
        partition_key: String,
        row_key: String,
    },

    /// 書き込み先テーブルが存在しない
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// テーブルの作成・状態確認に失敗
    #[error("Table error: {0}")]
    TableError(String),

    /// DynamoDBへの書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// データのシリアライズに失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// テーブル作成処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// 新しくテーブルを作成した
    Created,
    /// テーブルは既に存在していた
    AlreadyExists,
}

/// 書き込み時にストレージ側で付与する値
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMetadata {
    /// 書き込み日時
    pub timestamp: DateTime<Utc>,
    /// バージョントークン
    pub etag: String,
}

impl EntityMetadata {
    /// 書き込み日時からメタデータを生成
    ///
    /// ETagは`W/"datetime'<ミリ秒精度のRFC3339、':'はパーセントエンコード>'"`形式。
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        let encoded = timestamp
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace(':', "%3A");
        Self {
            timestamp,
            etag: format!("W/\"datetime'{}'\"", encoded),
        }
    }

    /// 現在時刻でメタデータを生成
    pub fn now() -> Self {
        Self::new(Utc::now())
    }
}

/// 商品エンティティ永続化用トレイト
///
/// 実際のDynamoDB実装とテスト用モックを差し替え可能にする。
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// テーブルが存在しなければ作成する（冪等）
    ///
    /// # 戻り値
    /// * `Ok(TableState::Created)` - 新規作成した（ACTIVEになるまで待機済み）
    /// * `Ok(TableState::AlreadyExists)` - 既に存在していた（作成中だった場合はACTIVEまで待機済み）
    /// * `Err(RepositoryError)` - 作成・状態確認に失敗
    async fn ensure_table(&self) -> Result<TableState, RepositoryError>;

    /// 商品エンティティを新規登録する
    ///
    /// 同じPartitionKey+RowKeyのエンティティが存在する場合は上書きせず
    /// `RepositoryError::DuplicateKey`を返す。
    ///
    /// # 戻り値
    /// * `Ok(EntityMetadata)` - 付与されたTimestampとETag
    /// * `Err(RepositoryError)` - 書き込み失敗
    async fn insert(&self, entity: &ProductEntity) -> Result<EntityMetadata, RepositoryError>;
}

/// DynamoDBに書き込む商品アイテムの形状
///
/// 属性名はリクエストのJSONプロパティ名と同じ。未指定の文字列属性は書き込まない。
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ProductItem<'a> {
    partition_key: &'a str,
    row_key: &'a str,
    timestamp: String,
    #[serde(rename = "ETag")]
    etag: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_description: Option<&'a str>,
    price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url_path: Option<&'a str>,
}

/// ProductRepositoryのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoProductRepository {
    /// DynamoDBクライアント
    client: DynamoDbClient,
    /// 商品テーブル名
    table_name: String,
}

impl DynamoProductRepository {
    /// 新しいDynamoProductRepositoryを作成
    ///
    /// # 引数
    /// * `client` - DynamoDBクライアント
    /// * `table_name` - 商品テーブルの名前
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// 商品テーブル名を取得
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// キー属性の型定義（どちらも文字列）
    fn attribute_definitions() -> Result<Vec<AttributeDefinition>, RepositoryError> {
        [PARTITION_KEY_ATTRIBUTE, ROW_KEY_ATTRIBUTE]
            .into_iter()
            .map(|name| {
                AttributeDefinition::builder()
                    .attribute_name(name)
                    .attribute_type(ScalarAttributeType::S)
                    .build()
                    .map_err(|e| RepositoryError::TableError(e.to_string()))
            })
            .collect()
    }

    /// キースキーマ（PartitionKey: HASH, RowKey: RANGE）
    fn key_schema() -> Result<Vec<KeySchemaElement>, RepositoryError> {
        [
            (PARTITION_KEY_ATTRIBUTE, KeyType::Hash),
            (ROW_KEY_ATTRIBUTE, KeyType::Range),
        ]
        .into_iter()
        .map(|(name, key_type)| {
            KeySchemaElement::builder()
                .attribute_name(name)
                .key_type(key_type)
                .build()
                .map_err(|e| RepositoryError::TableError(e.to_string()))
        })
        .collect()
    }

    /// エンティティとメタデータからDynamoDBアイテムを構築
    fn build_item(
        entity: &ProductEntity,
        metadata: &EntityMetadata,
    ) -> Result<HashMap<String, AttributeValue>, RepositoryError> {
        let item = ProductItem {
            partition_key: &entity.partition_key,
            row_key: &entity.row_key,
            timestamp: metadata
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            etag: &metadata.etag,
            name: entity.name.as_deref(),
            product_description: entity.product_description.as_deref(),
            price: entity.price,
            category: entity.category.as_deref(),
            image_url_path: entity.image_url_path.as_deref(),
        };

        serde_dynamo::to_item(item).map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    /// PutItemのエラーをリポジトリエラーに変換
    ///
    /// 条件式の不成立は重複キー、テーブル未作成（ACTIVE前を含む）はTableNotFoundとする。
    fn map_put_item_error(&self, error: PutItemError, entity: &ProductEntity) -> RepositoryError {
        if error.is_conditional_check_failed_exception() {
            return RepositoryError::DuplicateKey {
                partition_key: entity.partition_key.clone(),
                row_key: entity.row_key.clone(),
            };
        }
        if error.is_resource_not_found_exception() {
            return RepositoryError::TableNotFound(self.table_name.clone());
        }
        RepositoryError::WriteError(error.to_string())
    }

    /// テーブルがACTIVEになるまで待機
    async fn wait_until_active(&self) -> Result<(), RepositoryError> {
        for attempt in 1..=TABLE_ACTIVE_MAX_ATTEMPTS {
            let output = self
                .client
                .describe_table()
                .table_name(&self.table_name)
                .send()
                .await
                .map_err(|e| RepositoryError::TableError(e.into_service_error().to_string()))?;

            let status = output.table().and_then(|table| table.table_status());
            if status == Some(&TableStatus::Active) {
                return Ok(());
            }

            debug!(
                table = %self.table_name,
                attempt = attempt,
                status = ?status,
                "テーブルのACTIVE待機中"
            );
            tokio::time::sleep(TABLE_ACTIVE_POLL_INTERVAL).await;
        }

        Err(RepositoryError::TableError(format!(
            "table {} did not become ACTIVE",
            self.table_name
        )))
    }
}

#[async_trait]
impl ProductRepository for DynamoProductRepository {
    async fn ensure_table(&self) -> Result<TableState, RepositoryError> {
        let result = self
            .client
            .create_table()
            .table_name(&self.table_name)
            .set_attribute_definitions(Some(Self::attribute_definitions()?))
            .set_key_schema(Some(Self::key_schema()?))
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(table = %self.table_name, "テーブルを作成");
                self.wait_until_active().await?;
                Ok(TableState::Created)
            }
            Err(err) => {
                let service_error = err.into_service_error();
                if !service_error.is_resource_in_use_exception() {
                    return Err(RepositoryError::TableError(service_error.to_string()));
                }

                // 他のインスタンスが作成中（CREATING）の場合もACTIVEまで待つ
                debug!(table = %self.table_name, "テーブルは既に存在");
                self.wait_until_active().await?;
                Ok(TableState::AlreadyExists)
            }
        }
    }

    async fn insert(&self, entity: &ProductEntity) -> Result<EntityMetadata, RepositoryError> {
        let metadata = EntityMetadata::now();
        let item = Self::build_item(entity, &metadata)?;

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression(INSERT_CONDITION)
            .send()
            .await;

        match result {
            Ok(_) => Ok(metadata),
            Err(err) => Err(self.map_put_item_error(err.into_service_error(), entity)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::error::{
        ConditionalCheckFailedException, ProvisionedThroughputExceededException,
        ResourceNotFoundException,
    };
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    fn widget_entity() -> ProductEntity {
        ProductEntity {
            partition_key: "p1".to_string(),
            row_key: "r1".to_string(),
            name: Some("Widget".to_string()),
            product_description: Some("A widget".to_string()),
            price: 9.99,
            category: Some("Tools".to_string()),
            image_url_path: Some("/img/w.png".to_string()),
        }
    }

    fn fixed_metadata() -> EntityMetadata {
        EntityMetadata::new(Utc.with_ymd_and_hms(2024, 5, 1, 3, 30, 0).unwrap())
    }

    // ==================== エラー型テスト ====================

    #[test]
    fn test_repository_error_display() {
        assert_eq!(
            RepositoryError::DuplicateKey {
                partition_key: "p1".to_string(),
                row_key: "r1".to_string(),
            }
            .to_string(),
            "Entity already exists: PartitionKey=p1, RowKey=r1"
        );
        assert_eq!(
            RepositoryError::TableNotFound("Products".to_string()).to_string(),
            "Table not found: Products"
        );
        assert_eq!(
            RepositoryError::TableError("throttled".to_string()).to_string(),
            "Table error: throttled"
        );
        assert_eq!(
            RepositoryError::WriteError("service unavailable".to_string()).to_string(),
            "Write error: service unavailable"
        );
        assert_eq!(
            RepositoryError::SerializationError("invalid number".to_string()).to_string(),
            "Serialization error: invalid number"
        );
    }

    // ==================== メタデータテスト ====================

    #[test]
    fn test_entity_metadata_etag_format() {
        let metadata = fixed_metadata();
        assert_eq!(
            metadata.etag,
            "W/\"datetime'2024-05-01T03%3A30%3A00.000Z'\""
        );
    }

    #[test]
    fn test_entity_metadata_now_is_recent() {
        let before = Utc::now();
        let metadata = EntityMetadata::now();
        let after = Utc::now();

        assert!(metadata.timestamp >= before);
        assert!(metadata.timestamp <= after);
        assert!(metadata.etag.starts_with("W/\"datetime'"));
    }

    // ==================== アイテム構築テスト ====================

    #[test]
    fn test_build_item_all_fields() {
        let item =
            DynamoProductRepository::build_item(&widget_entity(), &fixed_metadata()).unwrap();

        assert_eq!(item.get("PartitionKey"), Some(&AttributeValue::S("p1".to_string())));
        assert_eq!(item.get("RowKey"), Some(&AttributeValue::S("r1".to_string())));
        assert_eq!(item.get("Name"), Some(&AttributeValue::S("Widget".to_string())));
        assert_eq!(
            item.get("ProductDescription"),
            Some(&AttributeValue::S("A widget".to_string()))
        );
        assert_eq!(item.get("Category"), Some(&AttributeValue::S("Tools".to_string())));
        assert_eq!(
            item.get("ImageUrlPath"),
            Some(&AttributeValue::S("/img/w.png".to_string()))
        );
        assert_eq!(
            item.get("Timestamp"),
            Some(&AttributeValue::S("2024-05-01T03:30:00.000Z".to_string()))
        );
        assert_eq!(
            item.get("ETag"),
            Some(&AttributeValue::S(
                "W/\"datetime'2024-05-01T03%3A30%3A00.000Z'\"".to_string()
            ))
        );

        let price = item.get("Price").and_then(|v| v.as_n().ok()).unwrap();
        assert_eq!(price.parse::<f64>().unwrap(), 9.99);
    }

    /// 未指定の文字列属性は書き込まない
    #[test]
    fn test_build_item_omits_absent_fields() {
        let entity = ProductEntity {
            partition_key: "p1".to_string(),
            row_key: "r1".to_string(),
            name: None,
            product_description: None,
            price: 0.0,
            category: None,
            image_url_path: None,
        };

        let item = DynamoProductRepository::build_item(&entity, &fixed_metadata()).unwrap();

        assert!(!item.contains_key("Name"));
        assert!(!item.contains_key("ProductDescription"));
        assert!(!item.contains_key("Category"));
        assert!(!item.contains_key("ImageUrlPath"));
        assert!(item.contains_key("Price"));
        assert_eq!(item.len(), 5);
    }

    // ==================== テーブル定義テスト ====================

    #[test]
    fn test_key_schema() {
        let schema = DynamoProductRepository::key_schema().unwrap();

        assert_eq!(schema.len(), 2);
        assert_eq!(schema[0].attribute_name(), "PartitionKey");
        assert_eq!(schema[0].key_type(), &KeyType::Hash);
        assert_eq!(schema[1].attribute_name(), "RowKey");
        assert_eq!(schema[1].key_type(), &KeyType::Range);
    }

    #[test]
    fn test_attribute_definitions() {
        let definitions = DynamoProductRepository::attribute_definitions().unwrap();

        assert_eq!(definitions.len(), 2);
        assert!(definitions
            .iter()
            .all(|d| d.attribute_type() == &ScalarAttributeType::S));
        assert_eq!(definitions[0].attribute_name(), "PartitionKey");
        assert_eq!(definitions[1].attribute_name(), "RowKey");
    }

    fn create_dynamo_repository() -> DynamoProductRepository {
        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .region(aws_sdk_dynamodb::config::Region::new("ap-northeast-1"))
            .build();
        let client = DynamoDbClient::from_conf(config);

        DynamoProductRepository::new(client, "Products".to_string())
    }

    #[test]
    fn test_dynamo_repository_table_name() {
        let repo = create_dynamo_repository();
        assert_eq!(repo.table_name(), "Products");
    }

    // ==================== PutItemエラー変換テスト ====================

    #[test]
    fn test_map_put_item_error_conditional_check_failed() {
        let repo = create_dynamo_repository();
        let error = PutItemError::ConditionalCheckFailedException(
            ConditionalCheckFailedException::builder()
                .message("The conditional request failed")
                .build(),
        );

        assert_eq!(
            repo.map_put_item_error(error, &widget_entity()),
            RepositoryError::DuplicateKey {
                partition_key: "p1".to_string(),
                row_key: "r1".to_string(),
            }
        );
    }

    #[test]
    fn test_map_put_item_error_resource_not_found() {
        let repo = create_dynamo_repository();
        let error = PutItemError::ResourceNotFoundException(
            ResourceNotFoundException::builder()
                .message("Requested resource not found")
                .build(),
        );

        assert_eq!(
            repo.map_put_item_error(error, &widget_entity()),
            RepositoryError::TableNotFound("Products".to_string())
        );
    }

    #[test]
    fn test_map_put_item_error_other() {
        let repo = create_dynamo_repository();
        let error = PutItemError::ProvisionedThroughputExceededException(
            ProvisionedThroughputExceededException::builder()
                .message("Rate exceeded")
                .build(),
        );

        let mapped = repo.map_put_item_error(error, &widget_entity());

        match mapped {
            RepositoryError::WriteError(detail) => assert!(detail.contains("Rate exceeded")),
            other => panic!("WriteErrorを期待: {:?}", other),
        }
    }

    // ==================== モックリポジトリ ====================

    /// モック上のテーブル状態
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum MockTableStatus {
        /// 未作成
        Missing,
        /// 他のインスタンスが作成中（CREATING）
        Creating,
        /// 書き込み可能（ACTIVE）
        Active,
    }

    /// ユニットテスト用のモックProductRepository
    ///
    /// DynamoDBと同様に、ACTIVEでないテーブルへの書き込みと重複キーの書き込みを拒否する。
    #[derive(Debug, Clone)]
    pub struct MockProductRepository {
        /// 保存されたエンティティ: (PartitionKey, RowKey) -> ProductEntity
        entities: Arc<Mutex<HashMap<(String, String), ProductEntity>>>,
        /// テーブルの状態
        table_status: Arc<Mutex<MockTableStatus>>,
        /// ensure_tableの呼び出し回数
        ensure_calls: Arc<Mutex<usize>>,
        /// 次の操作で返すエラー（エラーパスのテスト用）
        next_error: Arc<Mutex<Option<RepositoryError>>>,
    }

    impl MockProductRepository {
        /// テーブル作成済みのモック
        pub fn new() -> Self {
            Self::with_status(MockTableStatus::Active)
        }

        /// テーブル未作成のモック（新規プロビジョニング直後の状態）
        pub fn without_table() -> Self {
            Self::with_status(MockTableStatus::Missing)
        }

        /// 他のインスタンスがテーブルを作成中のモック
        pub fn creating() -> Self {
            Self::with_status(MockTableStatus::Creating)
        }

        fn with_status(status: MockTableStatus) -> Self {
            Self {
                entities: Arc::new(Mutex::new(HashMap::new())),
                table_status: Arc::new(Mutex::new(status)),
                ensure_calls: Arc::new(Mutex::new(0)),
                next_error: Arc::new(Mutex::new(None)),
            }
        }

        pub fn set_next_error(&self, error: RepositoryError) {
            *self.next_error.lock().unwrap() = Some(error);
        }

        pub fn get_entity(&self, partition_key: &str, row_key: &str) -> Option<ProductEntity> {
            self.entities
                .lock()
                .unwrap()
                .get(&(partition_key.to_string(), row_key.to_string()))
                .cloned()
        }

        pub fn entity_count(&self) -> usize {
            self.entities.lock().unwrap().len()
        }

        /// テーブルがACTIVEか
        pub fn table_exists(&self) -> bool {
            *self.table_status.lock().unwrap() == MockTableStatus::Active
        }

        pub fn ensure_calls(&self) -> usize {
            *self.ensure_calls.lock().unwrap()
        }

        fn take_error(&self) -> Option<RepositoryError> {
            self.next_error.lock().unwrap().take()
        }
    }

    #[async_trait]
    impl ProductRepository for MockProductRepository {
        async fn ensure_table(&self) -> Result<TableState, RepositoryError> {
            *self.ensure_calls.lock().unwrap() += 1;

            if let Some(error) = self.take_error() {
                return Err(error);
            }

            // 作成・作成中のどちらもACTIVEになるまで待った扱い
            let mut status = self.table_status.lock().unwrap();
            let state = match *status {
                MockTableStatus::Missing => TableState::Created,
                MockTableStatus::Creating | MockTableStatus::Active => TableState::AlreadyExists,
            };
            *status = MockTableStatus::Active;
            Ok(state)
        }

        async fn insert(&self, entity: &ProductEntity) -> Result<EntityMetadata, RepositoryError> {
            if let Some(error) = self.take_error() {
                return Err(error);
            }

            if !self.table_exists() {
                return Err(RepositoryError::TableNotFound("Products".to_string()));
            }

            let key = (entity.partition_key.clone(), entity.row_key.clone());
            let mut entities = self.entities.lock().unwrap();
            if entities.contains_key(&key) {
                return Err(RepositoryError::DuplicateKey {
                    partition_key: entity.partition_key.clone(),
                    row_key: entity.row_key.clone(),
                });
            }
            entities.insert(key, entity.clone());

            Ok(EntityMetadata::now())
        }
    }

    // ==================== モックリポジトリのテスト ====================

    #[tokio::test]
    async fn test_mock_repo_insert_success() {
        let repo = MockProductRepository::new();

        let metadata = repo.insert(&widget_entity()).await.unwrap();

        assert!(metadata.etag.starts_with("W/\"datetime'"));
        assert_eq!(repo.entity_count(), 1);
        assert_eq!(repo.get_entity("p1", "r1"), Some(widget_entity()));
    }

    /// 同一キーの二重登録は上書きせずDuplicateKeyを返す
    #[tokio::test]
    async fn test_mock_repo_insert_duplicate() {
        let repo = MockProductRepository::new();
        repo.insert(&widget_entity()).await.unwrap();

        let mut second = widget_entity();
        second.name = Some("Gadget".to_string());
        let result = repo.insert(&second).await;

        assert_eq!(
            result.unwrap_err(),
            RepositoryError::DuplicateKey {
                partition_key: "p1".to_string(),
                row_key: "r1".to_string(),
            }
        );
        assert_eq!(repo.entity_count(), 1);
        assert_eq!(
            repo.get_entity("p1", "r1").unwrap().name.as_deref(),
            Some("Widget")
        );
    }

    /// 同じパーティション内でもRowKeyが異なれば共存できる
    #[tokio::test]
    async fn test_mock_repo_insert_same_partition_distinct_rows() {
        let repo = MockProductRepository::new();
        let mut second = widget_entity();
        second.row_key = "r2".to_string();

        repo.insert(&widget_entity()).await.unwrap();
        repo.insert(&second).await.unwrap();

        assert_eq!(repo.entity_count(), 2);
        assert!(repo.get_entity("p1", "r2").is_some());
    }

    #[tokio::test]
    async fn test_mock_repo_insert_without_table() {
        let repo = MockProductRepository::without_table();

        let result = repo.insert(&widget_entity()).await;

        assert_eq!(
            result.unwrap_err(),
            RepositoryError::TableNotFound("Products".to_string())
        );
        assert_eq!(repo.entity_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_repo_ensure_table_idempotent() {
        let repo = MockProductRepository::without_table();

        assert_eq!(repo.ensure_table().await.unwrap(), TableState::Created);
        assert_eq!(repo.ensure_table().await.unwrap(), TableState::AlreadyExists);
        assert!(repo.table_exists());
        assert_eq!(repo.ensure_calls(), 2);
    }

    /// 作成中のテーブルには書き込めず、ensure_table後は書き込める
    #[tokio::test]
    async fn test_mock_repo_table_being_created() {
        let repo = MockProductRepository::creating();

        assert_eq!(
            repo.insert(&widget_entity()).await.unwrap_err(),
            RepositoryError::TableNotFound("Products".to_string())
        );

        assert_eq!(repo.ensure_table().await.unwrap(), TableState::AlreadyExists);
        assert!(repo.table_exists());
        repo.insert(&widget_entity()).await.unwrap();
        assert_eq!(repo.entity_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_repo_insert_error() {
        let repo = MockProductRepository::new();
        repo.set_next_error(RepositoryError::WriteError("DynamoDB unavailable".to_string()));

        let result = repo.insert(&widget_entity()).await;

        assert_eq!(
            result.unwrap_err(),
            RepositoryError::WriteError("DynamoDB unavailable".to_string())
        );
        assert_eq!(repo.entity_count(), 0);
    }
}
