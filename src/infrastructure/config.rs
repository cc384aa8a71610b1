/// 商品ストレージ接続設定
///
/// 環境変数`STORAGE_CONNECTION_STRING`の接続文字列からDynamoDBクライアントを構築する。
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use thiserror::Error;
use url::Url;

/// 接続文字列の環境変数名
pub const CONNECTION_STRING_ENV: &str = "STORAGE_CONNECTION_STRING";

/// 商品テーブル名
pub const PRODUCTS_TABLE_NAME: &str = "Products";

/// ストレージ設定のエラー型
#[derive(Debug, Error)]
pub enum StorageConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),
}

/// パース済みの接続文字列
///
/// `Key=Value`をセミコロンで区切った形式。キーは大文字小文字を区別しない。
/// - `Region`: テーブルのAWSリージョン（省略時はAWS標準のリージョン解決）
/// - `Endpoint`: DynamoDB互換エンドポイントのURL（DynamoDB Local等）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageConnectionString {
    region: Option<String>,
    endpoint: Option<Url>,
}

impl StorageConnectionString {
    /// 接続文字列をパース
    ///
    /// 空のセグメント（末尾のセミコロン等）は無視する。
    /// 未知のキー、`=`の欠落、空の値、キーの重複はエラー。
    ///
    /// # 例
    /// ```
    /// use product_ingest::infrastructure::StorageConnectionString;
    ///
    /// let conn = StorageConnectionString::parse(
    ///     "Region=ap-northeast-1;Endpoint=http://localhost:8000",
    /// )
    /// .unwrap();
    /// assert_eq!(conn.region(), Some("ap-northeast-1"));
    /// ```
    pub fn parse(value: &str) -> Result<Self, StorageConfigError> {
        if value.trim().is_empty() {
            return Err(StorageConfigError::InvalidConnectionString(
                "connection string is empty".to_string(),
            ));
        }

        let mut conn = Self::default();

        for segment in value.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, raw) = segment.split_once('=').ok_or_else(|| {
                StorageConfigError::InvalidConnectionString(format!(
                    "segment without '=': {}",
                    segment
                ))
            })?;
            let key = key.trim();
            let raw = raw.trim();

            if raw.is_empty() {
                return Err(StorageConfigError::InvalidConnectionString(format!(
                    "empty value for key: {}",
                    key
                )));
            }

            if key.eq_ignore_ascii_case("Region") {
                if conn.region.is_some() {
                    return Err(Self::duplicate_key(key));
                }
                conn.region = Some(raw.to_string());
            } else if key.eq_ignore_ascii_case("Endpoint") {
                if conn.endpoint.is_some() {
                    return Err(Self::duplicate_key(key));
                }
                conn.endpoint = Some(Self::parse_endpoint(raw)?);
            } else {
                return Err(StorageConfigError::InvalidConnectionString(format!(
                    "unknown key: {}",
                    key
                )));
            }
        }

        Ok(conn)
    }

    /// リージョンを取得
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// エンドポイントURLを取得
    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    /// EndpointはhttpまたはhttpsのURLのみ受け付ける
    fn parse_endpoint(raw: &str) -> Result<Url, StorageConfigError> {
        let url = Url::parse(raw).map_err(|e| {
            StorageConfigError::InvalidConnectionString(format!("invalid Endpoint: {}", e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(StorageConfigError::InvalidConnectionString(format!(
                "unsupported Endpoint scheme: {}",
                scheme
            ))),
        }
    }

    fn duplicate_key(key: &str) -> StorageConfigError {
        StorageConfigError::InvalidConnectionString(format!("duplicate key: {}", key))
    }
}

/// DynamoDBクライアントと商品テーブル名を持つ設定
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// DynamoDBクライアントインスタンス
    client: DynamoDbClient,
    /// 商品テーブル名
    products_table: String,
}

impl StorageConfig {
    /// 環境変数の接続文字列からAWS設定を読み込み、新しいStorageConfigを作成
    ///
    /// 環境変数:
    /// - AWS認証情報: aws-configにより自動読み込み
    /// - STORAGE_CONNECTION_STRING: 接続文字列（必須）
    pub async fn from_env() -> Result<Self, StorageConfigError> {
        let value = std::env::var(CONNECTION_STRING_ENV)
            .map_err(|_| StorageConfigError::MissingEnvVar(CONNECTION_STRING_ENV.to_string()))?;

        let conn = StorageConnectionString::parse(&value)?;

        Ok(Self::from_connection_string(&conn).await)
    }

    /// パース済み接続文字列からStorageConfigを作成
    pub async fn from_connection_string(conn: &StorageConnectionString) -> Self {
        // 環境からAWS設定を読み込み、接続文字列の指定で上書き
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = conn.region() {
            loader = loader.region(Region::new(region.to_string()));
        }

        if let Some(endpoint) = conn.endpoint() {
            loader = loader.endpoint_url(endpoint.as_str().trim_end_matches('/'));
        }

        let aws_config = loader.load().await;

        Self {
            client: DynamoDbClient::new(&aws_config),
            products_table: PRODUCTS_TABLE_NAME.to_string(),
        }
    }

    /// 明示的な値で新しいStorageConfigを作成（テスト用）
    pub fn new(client: DynamoDbClient, products_table: String) -> Self {
        Self {
            client,
            products_table,
        }
    }

    /// DynamoDBクライアントへの参照を取得
    pub fn client(&self) -> &DynamoDbClient {
        &self.client
    }

    /// 商品テーブル名を取得
    pub fn products_table(&self) -> &str {
        &self.products_table
    }
}
