// Infrastructure layer modules
pub mod config;
pub mod logging;
pub mod product_repository;

// Re-exports
pub use config::{StorageConfig, StorageConfigError, StorageConnectionString};
pub use logging::init_logging;
pub use product_repository::{
    DynamoProductRepository, EntityMetadata, ProductRepository, RepositoryError, TableState,
};
