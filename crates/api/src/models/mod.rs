//! Domain models.
//!
//! These are validated domain objects, separate from the database row types in
//! [`crate::db`] and the JSON views in [`crate::routes`].

pub mod cart;
pub mod order;
pub mod product;
pub mod profile;
pub mod user;

pub use cart::{Cart, CartItem, CartItemAction, InvalidAction, QuantityOutcome};
pub use order::{CardSummary, NewOrder, NewOrderItem, Order, OrderItem, TokenizedCard};
pub use product::{NewProduct, Product, ProductChanges};
pub use profile::{Profile, ProfileChanges};
pub use user::{CurrentUser, User};
