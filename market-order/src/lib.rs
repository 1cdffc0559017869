pub mod error;
pub mod models;
pub mod repository;
pub mod memory;
pub mod orchestrator;
pub mod service;

pub use error::OrderError;
pub use models::{NewOrder, Order, OrderStatus, PlaceOrderRequest};
pub use repository::OrderRepository;
pub use memory::InMemoryOrderRepository;
pub use orchestrator::PaymentOrchestrator;
pub use service::{OrderOptions, OrderService, PlacedOrder};
