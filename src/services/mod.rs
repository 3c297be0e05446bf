pub mod analytics_service;
pub mod auth_service;
pub mod collection_service;
pub mod megamenu_service;
pub mod order_service;
pub mod payment_service;
pub mod product_service;
