/// 商品追加HTTP Lambdaエントリポイント
///
/// Lambda Function URL / API Gateway経由のPOSTリクエストで受け取った商品レコードを
/// DynamoDBのProductsテーブルに登録する。
///
/// DynamoDBクライアントとテーブル作成はコールドスタート時に一度だけ行い、
/// 以降のリクエストでは同じハンドラーを共有する。
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use product_ingest::application::AddProductHandler;
use product_ingest::infrastructure::{init_logging, DynamoProductRepository, StorageConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    info!("商品追加Lambda関数を初期化");

    // 環境変数の接続文字列からDynamoDB設定を読み込み
    let config = StorageConfig::from_env().await.inspect_err(|err| {
        error!(error = %err, "ストレージ設定読み込み失敗");
    })?;

    let product_repo = DynamoProductRepository::new(
        config.client().clone(),
        config.products_table().to_string(),
    );

    // Productsテーブルを作成（存在しない場合のみ）
    let handler = AddProductHandler::initialize(product_repo)
        .await
        .inspect_err(|err| {
            error!(
                table = config.products_table(),
                error = %err,
                "商品テーブル準備失敗"
            );
        })?;

    run(service_fn(|request| function_handler(&handler, request))).await
}

/// HTTPリクエストハンドラー
///
/// 処理結果はすべてHTTPレスポンスに変換済みのため、常に`Ok`を返す。
async fn function_handler(
    handler: &AddProductHandler<DynamoProductRepository>,
    request: Request,
) -> Result<Response<Body>, Error> {
    Ok(handler.handle_request(request).await)
}
