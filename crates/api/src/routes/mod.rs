//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /auth/jwt/create          - Email + password for access/refresh tokens
//! POST   /auth/jwt/refresh         - Refresh token for a new access token
//! POST   /auth/jwt/verify          - Check a token
//! POST   /auth/users               - Register
//! GET    /auth/users/me            - Current account
//!
//! # Profiles
//! GET    /profiles                 - Own profile (all for staff)
//! POST   /profiles                 - Create own profile
//! GET    /profiles/me              - Own profile, created on first access
//! PATCH  /profiles/me              - Update own profile
//! GET    /profiles/{id}            - Profile detail
//! PATCH  /profiles/{id}            - Update profile
//! DELETE /profiles/{id}            - Delete profile
//!
//! # Products (writes require staff)
//! GET    /products                 - Catalog
//! POST   /products                 - Create product
//! GET    /products/{id}            - Product detail
//! PUT    /products/{id}            - Replace product
//! PATCH  /products/{id}            - Update product
//! DELETE /products/{id}            - Delete product
//!
//! # Carts
//! GET    /carts                    - Own cart as a list
//! GET    /carts/me                 - Own cart
//! POST   /carts/clear              - Empty own cart
//!
//! # Cart items
//! GET    /cart-items               - Items in own cart
//! POST   /cart-items               - Add one unit of a product
//! GET    /cart-items/{id}          - Item detail
//! PATCH  /cart-items/{id}          - increment / decrement / remove
//! DELETE /cart-items/{id}          - Delete item
//!
//! # Orders (status changes and deletes require staff)
//! GET    /orders                   - Own orders (all for staff)
//! POST   /orders                   - Place an order
//! GET    /orders/me                - Own orders, newest first
//! GET    /orders/{id}              - Order detail
//! PATCH  /orders/{id}              - Change status
//! DELETE /orders/{id}              - Delete order
//!
//! # Order items (writes require staff)
//! GET    /order-items              - Lines of own orders (all for staff)
//! POST   /order-items              - Add a line to an order
//! GET    /order-items/{id}         - Line detail
//! PUT    /order-items/{id}         - Change status
//! PATCH  /order-items/{id}         - Change status
//! DELETE /order-items/{id}         - Delete line
//! ```
//!
//! Static segments such as `/me` are registered alongside `/{id}`; axum
//! prefers the static match.

pub mod auth;
pub mod cart_items;
pub mod carts;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod profiles;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/jwt/create", post(auth::create_token))
        .route("/jwt/refresh", post(auth::refresh_token))
        .route("/jwt/verify", post(auth::verify_token))
        .route("/users", post(auth::register))
        .route("/users/me", get(auth::me))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profiles::index).post(profiles::create))
        .route("/me", get(profiles::me).patch(profiles::update_me))
        .route(
            "/{id}",
            get(profiles::show)
                .patch(profiles::update)
                .delete(profiles::destroy),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::replace)
                .patch(products::update)
                .delete(products::destroy),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(carts::index))
        .route("/me", get(carts::me))
        .route("/clear", post(carts::clear))
}

/// Create the cart item routes router.
pub fn cart_item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_items::index).post(cart_items::create))
        .route(
            "/{id}",
            get(cart_items::show)
                .patch(cart_items::update)
                .delete(cart_items::destroy),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/me", get(orders::me))
        .route(
            "/{id}",
            get(orders::show)
                .patch(orders::update_status)
                .delete(orders::destroy),
        )
}

/// Create the order item routes router.
pub fn order_item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(order_items::index).post(order_items::create))
        .route(
            "/{id}",
            get(order_items::show)
                .put(order_items::update)
                .patch(order_items::update)
                .delete(order_items::destroy),
        )
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/profiles", profile_routes())
        .nest("/products", product_routes())
        .nest("/carts", cart_routes())
        .nest("/cart-items", cart_item_routes())
        .nest("/orders", order_routes())
        .nest("/order-items", order_item_routes())
}
