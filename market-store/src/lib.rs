pub mod app_config;
pub mod database;
pub mod order_repo;
pub mod catalog_repo;
pub mod payment_gateway;
pub mod redis_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use order_repo::PgOrderRepository;
pub use catalog_repo::PgProductRepository;
pub use payment_gateway::PortOneGateway;
pub use redis_repo::RedisClient;
