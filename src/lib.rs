pub mod error;
pub mod config;
pub mod tokenize;
pub mod partition;
pub mod cardinality;
pub mod clustering;
pub mod template;
pub mod catalog;
pub mod index;
pub mod scoring;
pub mod model;
pub mod anomaly;

pub use catalog::{CatalogEntry, ClusterCatalog};
pub use clustering::build_catalog;
pub use config::ClusterOpts;
pub use error::ClusterError;
pub use index::{build_index, extract_variables, match_line, EventIndex};
pub use model::TemplateModel;
pub use scoring::{score, Score};
pub use tokenize::VAR_TOKEN;
