mod event;
mod gateway_ref;
mod order;
mod payment;
mod refund;

pub use event::*;
pub use gateway_ref::*;
pub use order::*;
pub use payment::*;
pub use refund::*;
