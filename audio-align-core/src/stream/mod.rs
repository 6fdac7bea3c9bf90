pub mod channel;
pub mod exact;
