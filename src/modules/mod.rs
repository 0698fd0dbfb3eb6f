pub mod health;
pub mod lead;
pub mod notification;
pub mod verification;

mod router;
pub use router::get_router;
