//! Framed, checksummed message transport for blockchain peers.
//!
//! # Crate Structure
//!
//! - [`frame`]: length-prefixed, CRC-32 checked framing and the `Message` payload
//! - [`node`]: peer sessions, dispatch, TCP node and launcher

/// Re-export frame types.
pub mod frame {
    pub use chainwire_frame::*;
}

/// Re-export node types.
pub mod node {
    pub use chainwire_node::*;
}
