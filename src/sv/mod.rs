pub mod commission;
pub mod feed;
pub mod gate;
pub mod ledger;
pub mod payment;
pub mod service;
#[cfg(test)]
pub mod test_utils;
pub mod user;

pub use commission::Commission;
pub use gate::Gate;
pub use ledger::Ledger;
pub use payment::Payment;
pub use service::Service;
pub use user::User;
