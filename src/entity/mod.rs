pub mod booking;
pub mod commission_payment;
pub mod service;
pub mod user;

pub use booking::BookingStatus;
pub use commission_payment::PaymentStatus;
pub use user::UserRole;
