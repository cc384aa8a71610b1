/// 商品リクエストボディのパーサー
///
/// Lambda HTTPリクエストのボディを文字列として取り出し、
/// 商品レコード（Product）にデシリアライズする
use lambda_http::Body;
use thiserror::Error;

use crate::domain::Product;

/// ボディパースエラー
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    /// 商品形状のJSONとしてパースできない
    #[error("failed to parse JSON: {0}")]
    InvalidJson(String),

    /// ボディがUTF-8文字列でない
    #[error("request body is not valid UTF-8")]
    InvalidEncoding,
}

/// 商品リクエストボディのパーサー
pub struct ProductParser;

impl ProductParser {
    /// リクエストボディを商品レコードにパース
    ///
    /// # 引数
    /// * `body` - リクエストボディ文字列
    ///
    /// # 戻り値
    /// * `Ok(Some(Product))` - パース成功時
    /// * `Ok(None)` - 空ボディ（空白のみを含む）またはJSONリテラル`null`
    /// * `Err(ParseError::InvalidJson)` - JSON不正、または商品オブジェクトでない
    ///
    /// # 例
    /// ```
    /// use product_ingest::application::ProductParser;
    ///
    /// let product = ProductParser::parse(r#"{"Name": "Widget"}"#).unwrap();
    /// assert_eq!(product.unwrap().name.as_deref(), Some("Widget"));
    /// assert!(ProductParser::parse("null").unwrap().is_none());
    /// ```
    pub fn parse(body: &str) -> Result<Option<Product>, ParseError> {
        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Option<Product>>(body)
            .map_err(|e| ParseError::InvalidJson(e.to_string()))
    }

    /// Lambdaリクエストボディを文字列として取り出す
    ///
    /// Binaryボディ（base64デコード済み）はUTF-8として解釈する。
    pub fn decode_body(body: &Body) -> Result<String, ParseError> {
        match body {
            Body::Empty => Ok(String::new()),
            Body::Text(text) => Ok(text.clone()),
            Body::Binary(bytes) => {
                String::from_utf8(bytes.clone()).map_err(|_| ParseError::InvalidEncoding)
            }
            _ => Err(ParseError::InvalidEncoding),
        }
    }
}
