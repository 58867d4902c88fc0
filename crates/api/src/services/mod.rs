//! Business logic services.
//!
//! Each service borrows the pool and wraps one or more repositories; routes
//! construct them per request.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod inventory;
pub mod notification;
pub mod orders;
pub mod payments;
pub mod reviews;
pub mod shipping;

pub use auth::AuthService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use inventory::InventoryService;
pub use notification::NotificationService;
pub use orders::OrderService;
pub use payments::PaymentService;
pub use reviews::ReviewService;
pub use shipping::ShippingService;
