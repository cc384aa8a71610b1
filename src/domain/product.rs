/// 商品レコードのドメインモデル
///
/// リクエストボディのJSON形状（Product）と、
/// パーティションキー・行キーを検証済みの保存単位（ProductEntity）を定義する。
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::de::{self, DeserializeOwned, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// 商品レコードのバリデーションエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProductValidationError {
    /// PartitionKeyが欠落（null・空文字列を含む）
    #[error("missing required field: PartitionKey")]
    MissingPartitionKey,
    /// RowKeyが欠落（null・空文字列を含む）
    #[error("missing required field: RowKey")]
    MissingRowKey,
}

/// リクエストボディで受け取る商品レコード
///
/// JSONプロパティ名はPascalCase（`PartitionKey`, `RowKey`, `ETag`など）だが、
/// 大文字小文字を区別せずに照合する（`partitionKey`や`rowkey`も受け付ける）。
/// 文字列フィールドはすべて省略可能で、`Price`は省略時0.0となる。
/// 未知のプロパティは無視する。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Product {
    /// パーティションキー
    pub partition_key: Option<String>,
    /// パーティション内の一意キー
    pub row_key: Option<String>,
    /// ストレージが書き込み時に付与する日時（クライアント指定値は使用しない）
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// ストレージが付与するバージョントークン（クライアント指定値は使用しない）
    pub etag: Option<String>,
    /// 商品名
    pub name: Option<String>,
    /// 商品説明
    pub product_description: Option<String>,
    /// 価格
    pub price: f64,
    /// カテゴリ
    pub category: Option<String>,
    /// 商品画像のパスまたはURL
    pub image_url_path: Option<String>,
}

/// Productのプロパティ名（正規形）
const FIELD_NAMES: [&str; 9] = [
    "PartitionKey",
    "RowKey",
    "Timestamp",
    "ETag",
    "Name",
    "ProductDescription",
    "Price",
    "Category",
    "ImageUrlPath",
];

type Fields = HashMap<&'static str, Value>;

impl<'de> Deserialize<'de> for Product {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ProductVisitor)
    }
}

struct ProductVisitor;

impl<'de> Visitor<'de> for ProductVisitor {
    type Value = Product;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a product object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Product, A::Error>
    where
        A: MapAccess<'de>,
    {
        // 同じプロパティが大文字小文字違いで複数ある場合は後勝ち
        let mut fields = Fields::new();
        while let Some(key) = map.next_key::<String>()? {
            let value: Value = map.next_value()?;
            if let Some(name) = FIELD_NAMES.iter().find(|name| name.eq_ignore_ascii_case(&key)) {
                fields.insert(*name, value);
            }
        }

        Product::from_fields(fields).map_err(de::Error::custom)
    }
}

/// 省略可能なフィールドを取り出す（未指定・nullはNone）
fn optional_field<T: DeserializeOwned>(
    fields: &mut Fields,
    name: &str,
) -> Result<Option<T>, String> {
    match fields.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decode_field(value, name).map(Some),
    }
}

fn decode_field<T: DeserializeOwned>(value: Value, name: &str) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("{}: {}", name, e))
}

impl Product {
    /// キーを検証して保存用エンティティに変換する
    ///
    /// PartitionKeyとRowKeyは必須。欠落・null・空文字列はいずれも拒否する。
    /// TimestampとETagはストレージ側で付与するため引き継がない。
    pub fn into_entity(self) -> Result<ProductEntity, ProductValidationError> {
        let partition_key = self
            .partition_key
            .filter(|key| !key.is_empty())
            .ok_or(ProductValidationError::MissingPartitionKey)?;

        let row_key = self
            .row_key
            .filter(|key| !key.is_empty())
            .ok_or(ProductValidationError::MissingRowKey)?;

        Ok(ProductEntity {
            partition_key,
            row_key,
            name: self.name,
            product_description: self.product_description,
            price: self.price,
            category: self.category,
            image_url_path: self.image_url_path,
        })
    }

    /// 正規化済みのプロパティから各フィールドを取り出す
    fn from_fields(mut fields: Fields) -> Result<Self, String> {
        // Priceはnull非許容の数値
        let price = match fields.remove("Price") {
            None => 0.0,
            Some(value) => decode_field(value, "Price")?,
        };

        Ok(Self {
            partition_key: optional_field(&mut fields, "PartitionKey")?,
            row_key: optional_field(&mut fields, "RowKey")?,
            timestamp: optional_field(&mut fields, "Timestamp")?,
            etag: optional_field(&mut fields, "ETag")?,
            name: optional_field(&mut fields, "Name")?,
            product_description: optional_field(&mut fields, "ProductDescription")?,
            price,
            category: optional_field(&mut fields, "Category")?,
            image_url_path: optional_field(&mut fields, "ImageUrlPath")?,
        })
    }
}

/// キー検証済みの商品エンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct ProductEntity {
    pub partition_key: String,
    pub row_key: String,
    pub name: Option<String>,
    pub product_description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub image_url_path: Option<String>,
}

impl ProductEntity {
    /// 応答メッセージに使う商品名（未指定時は空文字列）
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}
