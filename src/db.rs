//! Database backend: drivers, entities, and migrations.
pub mod driver;
pub mod entity;
pub mod migrations;
pub mod table;

pub mod prelude {
    pub use super::entity::*;
}
