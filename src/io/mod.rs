pub mod encoding;
pub mod net;
