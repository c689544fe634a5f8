//! # inventory-desk
//!
//! Back office for a small shop: categories, suppliers, customers, orders, shipments, products and employees kept in
//! a relational database, with username/password login.
//!
//! Every screen of the application works the same way:
//!
//! - all rows of one table are loaded into a [`ListView`](view::ListView);
//! - the view is filtered by a text and ordered by a per-entity sort key, entirely in memory;
//! - creating, editing and deleting goes one row at a time through a [`RecordStore`](store::RecordStore), and the
//!   view follows the outcome.
//!
//! The store implementations are SeaORM managers in [`db::entity`], reached via a [`Desk`] handle which is passed
//! around explicitly.
//!
//! ```no_run
//! # use inventory_desk::prelude::*;
//! # async fn example(desk: Desk) -> Result<()> {
//! let mut customers = desk.open(desk.customers()).await?;
//! customers.refresh("ivan", CustomerSort::LastNameDesc);
//! for customer in customers.view() {
//!     println!("{} {}", customer.last_name, customer.first_name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Backends
//!
//! SQLite is enabled by the default `sqlite` feature; PostgreSQL with `pg`. The `cli` feature (default) builds the
//! `inventory-desk` binary.
#[cfg(feature = "cli")]
pub mod app;
pub mod auth;
pub mod db;
pub mod desk;
pub mod store;
pub mod test;
pub mod types;
pub mod view;

#[doc(inline)]
pub use desk::Desk;
#[doc(inline)]
pub use view::ListView;

pub mod prelude {
    pub use crate::auth::Auth;
    pub use crate::auth::RegistrationForm;
    pub use crate::auth::Screen;
    pub use crate::auth::Session;
    pub use crate::db::prelude::*;
    pub use crate::desk::Desk;
    pub use crate::store::Listed;
    pub use crate::store::RecordStore;
    pub use crate::store::SortKey;
    pub use crate::types::*;
    pub use crate::view::ListView;
}
