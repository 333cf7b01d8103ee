pub use sea_orm_migration::prelude::*;

pub mod schema;
mod status;

pub mod m20261014_000001_add_custom_slug;
pub mod m20261014_000002_many_to_many_nodes;

pub use status::{inspect, RelationStatus, SchemaStatus, SlugStatus};
