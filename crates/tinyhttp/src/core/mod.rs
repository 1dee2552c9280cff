//! Pure transformations: URI resolution, redirect decisions and body encodings.
//!
//! Nothing in this module performs I/O. The effects layer calls into these
//! functions at each hop and acts on what they return.

mod encoding;
mod redirect;
mod uri;

pub use encoding::Encoding;
pub use redirect::{Decision, RedirectState, Route, decide, is_redirect};
pub use uri::{Scheme, apply_overrides, check_target, is_path_rooted, resolve};
