//! Miscellaneous utility structs and functions.

pub mod component;
mod errors;

#[doc(inline)]
pub use self::{
    component::{Component, ComponentState, ComponentTypes, WatchersSpawner},
    errors::{ErrorReport, Named},
};
