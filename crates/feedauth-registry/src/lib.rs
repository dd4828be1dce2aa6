//! Identity and credential keys for Azure Artifacts npm feeds.
//!
//! A feed is addressed by a registry URL in one of two shapes:
//!
//! * `https://{organization}.pkgs.visualstudio.com/[{project}/]_packaging/{feed}/npm/registry/`
//! * `https://pkgs.dev.azure.com/{organization}/[{project}/]_packaging/{feed}/npm/registry/`
//!
//! [`identify`] recovers the organization, project and feed from either
//! shape, and [`RegistryKeys`] computes the `.npmrc` key prefixes npm uses to
//! look up credentials for that URL.

pub use feed::{normalize_scope, Feed};
pub use identity::{identify, parse_registry_url, FeedIdentity, RegistryTopology};
pub use keys::{nerf_dart, RegistryKeys};

mod feed;
mod identity;
mod keys;

/// Path segment that precedes the feed name in every registry URL.
pub const PACKAGING_SEGMENT: &str = "_packaging";
