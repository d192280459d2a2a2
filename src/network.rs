pub mod request_queue;
pub mod rest_client;

pub use request_queue::{NetworkError, RequestQueue};
pub use rest_client::{RestClient, RestClientSet};
