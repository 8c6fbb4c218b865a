pub mod ring_access;
pub mod transport;
