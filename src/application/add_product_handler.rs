/// 商品追加ハンドラー
///
/// HTTP POSTで受け取った商品レコードを検証し、Productsテーブルに1件登録する
use lambda_http::http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use lambda_http::http::{Method, StatusCode};
use lambda_http::{Body, Request, Response};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::{ParseError, ProductParser};
use crate::domain::ProductValidationError;
use crate::infrastructure::{EntityMetadata, ProductRepository, RepositoryError};

/// 不正な商品データに対する応答本文
pub const INVALID_PRODUCT_MESSAGE: &str = "Invalid product data.";

/// 内部エラーに対する応答本文
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// 商品追加ハンドラーのエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AddProductError {
    /// 商品データがnull・空、またはキーが欠落（400）
    #[error("invalid product data: {0}")]
    InvalidPayload(String),

    /// ボディがJSONとして不正（500）
    #[error("malformed input: {0}")]
    MalformedInput(#[from] ParseError),

    /// ストレージへの書き込みに失敗（500）
    #[error("storage failure: {0}")]
    StorageFailure(#[from] RepositoryError),
}

impl From<ProductValidationError> for AddProductError {
    fn from(err: ProductValidationError) -> Self {
        AddProductError::InvalidPayload(err.to_string())
    }
}

impl AddProductError {
    /// エラーに対応するHTTPステータスコード
    pub fn status_code(&self) -> StatusCode {
        match self {
            AddProductError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            AddProductError::MalformedInput(_) | AddProductError::StorageFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 呼び出し元に返す応答本文（内部の詳細は含めない）
    pub fn response_body(&self) -> &'static str {
        match self {
            AddProductError::InvalidPayload(_) => INVALID_PRODUCT_MESSAGE,
            AddProductError::MalformedInput(_) | AddProductError::StorageFailure(_) => {
                INTERNAL_ERROR_MESSAGE
            }
        }
    }
}

/// 商品登録の結果
#[derive(Debug, Clone, PartialEq)]
pub struct ProductAdded {
    pub partition_key: String,
    pub row_key: String,
    /// ストレージが付与したTimestampとETag
    pub metadata: EntityMetadata,
    /// 応答本文: "Product {Name} added successfully."
    pub message: String,
}

/// 商品追加リクエストを処理するハンドラー
///
/// リポジトリはプロセス起動時に一度だけ構築し、全リクエストで共有する
pub struct AddProductHandler<PR>
where
    PR: ProductRepository,
{
    /// 商品リポジトリ
    product_repo: PR,
}

impl<PR> AddProductHandler<PR>
where
    PR: ProductRepository,
{
    /// 新しいAddProductHandlerを作成（テーブルの存在確認は行わない）
    pub fn new(product_repo: PR) -> Self {
        Self { product_repo }
    }

    /// 商品テーブルを作成（存在しない場合のみ）してからハンドラーを作成
    ///
    /// コールドスタート時に一度だけ呼び出す。
    pub async fn initialize(product_repo: PR) -> Result<Self, RepositoryError> {
        let state = product_repo.ensure_table().await?;
        info!(table_state = ?state, "商品テーブル準備完了");

        Ok(Self::new(product_repo))
    }

    /// 商品追加リクエストボディを処理
    ///
    /// # 処理フロー
    /// 1. ボディを商品レコードにパース（不正JSONはMalformedInput）
    /// 2. null・空ボディ、キー欠落はInvalidPayload
    /// 3. エンティティを新規登録（失敗はStorageFailure）
    /// 4. 応答メッセージを構築
    pub async fn handle(&self, body: &str) -> Result<ProductAdded, AddProductError> {
        let product = ProductParser::parse(body)?.ok_or_else(|| {
            AddProductError::InvalidPayload("product is null or empty".to_string())
        })?;

        let entity = product.into_entity()?;

        let metadata = self.product_repo.insert(&entity).await?;

        info!(
            partition_key = %entity.partition_key,
            row_key = %entity.row_key,
            etag = %metadata.etag,
            "商品登録完了"
        );

        Ok(ProductAdded {
            message: format!("Product {} added successfully.", entity.display_name()),
            partition_key: entity.partition_key,
            row_key: entity.row_key,
            metadata,
        })
    }

    /// Lambda HTTPリクエストを処理してレスポンスを生成
    ///
    /// # レスポンス
    /// - 200 OK: 登録成功（本文はメッセージ）
    /// - 400 Bad Request: "Invalid product data."
    /// - 405 Method Not Allowed: POST以外（Allow: POST）
    /// - 500 Internal Server Error: 不正JSON、ストレージ書き込み失敗
    pub async fn handle_request(&self, request: Request) -> Response<Body> {
        info!(method = %request.method(), "商品追加リクエスト受信");

        if *request.method() != Method::POST {
            warn!(method = %request.method(), "POST以外のメソッドを拒否");
            let mut response =
                Self::text_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("POST"));
            return response;
        }

        let result = match ProductParser::decode_body(request.body()) {
            Ok(body) => self.handle(&body).await,
            Err(err) => Err(AddProductError::from(err)),
        };

        Self::build_response(result)
    }

    /// 処理結果をHTTPレスポンスに変換
    pub fn build_response(result: Result<ProductAdded, AddProductError>) -> Response<Body> {
        match result {
            Ok(added) => Self::text_response(StatusCode::OK, &added.message),
            Err(err) => {
                match &err {
                    AddProductError::InvalidPayload(_) => {
                        warn!(error = %err, "不正な商品データ");
                    }
                    AddProductError::MalformedInput(_) | AddProductError::StorageFailure(_) => {
                        error!(error = %err, "商品追加処理エラー");
                    }
                }
                Self::text_response(err.status_code(), err.response_body())
            }
        }
    }

    fn text_response(status: StatusCode, body: &str) -> Response<Body> {
        let mut response = Response::new(Body::Text(body.to_string()));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
        response
    }
}
