pub mod bvlc;
pub mod frame;
pub mod transport;
