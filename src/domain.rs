// Domain layer modules
pub mod product;

// Re-exports
pub use product::{Product, ProductEntity, ProductValidationError};
