//! Template resolution pipeline
//!
//! Each stage is a function of its inputs: locate the template, split its
//! metadata, resolve boot images, then assemble the instance descriptor
//! (naming, OS classification and startup script selection happen there).

pub mod descriptor;
pub mod images;
pub mod locator;
pub mod metadata;
pub mod naming;
pub mod os_type;
pub mod startup;
pub mod urls;

pub use descriptor::{DescriptorInputs, InstanceDescriptor, assemble};
pub use images::{BootImages, ImageReference, resolve_boot_images};
pub use locator::{LocatedTemplate, locate_template};
pub use metadata::{ExtendedMetadata, split_metadata};
pub use naming::{NamePattern, Placeholder, UniqueToken, resolve_name};
pub use os_type::{OsClassifier, OsType};
pub use startup::StartupScripts;
pub use urls::ResourceUrls;

/// Region of a zone: its first two dash-delimited components
/// (`us-central1-a` -> `us-central1`)
pub fn region_of(zone: &str) -> &str {
    match zone.match_indices('-').nth(1) {
        Some((idx, _)) => &zone[..idx],
        None => zone,
    }
}
