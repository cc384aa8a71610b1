// アプリケーション層モジュール
pub mod add_product_handler;
pub mod product_parser;

// 再エクスポート
pub use add_product_handler::{AddProductError, AddProductHandler, ProductAdded};
pub use product_parser::{ParseError, ProductParser};
