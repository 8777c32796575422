//! Packaging
//!
//! Assembles the built extension, the native libraries it depends on and
//! the pure-Python package modules into one wheel.

pub mod bundle;
pub mod error;
pub mod record;
pub mod wheel;

pub use bundle::{
    AUTHOR, AUTHOR_EMAIL, BUILD_REQUIRES, NATIVE_PACKAGE, PACKAGE_NAME, PACKAGE_VERSION, PACKAGES,
    PackageBundle, PackageData, PackageDataFile, PackageMetadata, enumerate_package_data,
};
pub use error::PackageError;
pub use record::{RecordEntry, digest};
pub use wheel::{WheelOutput, WheelWriter, read_entry};
