// Adapters behind the ports in `app::ports`

pub mod archive;
pub mod http_client;
pub mod logging_delivery;

pub use http_client::ReqwestCollector;
pub use logging_delivery::LoggingDelivery;
