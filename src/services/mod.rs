pub mod order;
pub mod payment;
pub mod providers;

pub use order::OrderService;
pub use payment::PaymentService;
pub use providers::PaymentGateway;
