//! Command implementations

pub(crate) mod build;
pub(crate) mod completion;
pub(crate) mod descriptor;
pub(crate) mod doctor;
pub(crate) mod toolchain;
