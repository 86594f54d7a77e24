#![warn(clippy::all, clippy::pedantic)]

// disable some style lints
#![allow(clippy::needless_return, clippy::must_use_candidate, clippy::comparison_chain)]
#![allow(clippy::redundant_field_names, clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unreadable_literal, clippy::option_if_let_else, clippy::range_plus_one)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc, clippy::module_name_repetitions)]

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap, clippy::cast_lossless, clippy::cast_sign_loss)]
#![allow(clippy::default_trait_access, clippy::many_single_char_names)]

// Tests lints
#![cfg_attr(test, allow(clippy::float_cmp))]

//! Rotation and permutation invariant (RPI) basis functions for atomic
//! environments, following the atomic cluster expansion.
//!
//! The basis is built in three layers: a one-particle basis of radial times
//! spherical harmonics functions ([`basis`]), symmetric products of these
//! functions ([`pibasis`]), and a sparse projection of these products onto
//! rotation invariant combinations ([`coupling`] and [`rpi`]).

pub mod types;
pub use types::*;

pub mod math;

mod errors;
pub use self::errors::Error;

mod environment;
pub use self::environment::Environment;

pub mod basis;
pub mod pibasis;
pub mod coupling;

pub mod rpi;
pub use self::rpi::{RpiBasis, RpiBasisParameters};
