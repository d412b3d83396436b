//! Domain layer: payee resolution, contact indexing and the payment
//! authorization state machine. Nothing here performs I/O; the outside
//! world is reached through the traits in [`ports`].

pub mod contact;
pub mod machine;
pub mod payee;
pub mod ports;
pub mod session;
