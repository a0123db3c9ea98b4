//! Template, actions and signing

pub mod action;
pub mod sign;
pub mod template;

pub use action::{Destination, Source};
pub use sign::{assemble_signatures, attach_signature, sign_template};
pub use template::{combine, SigningInstruction, Template};
