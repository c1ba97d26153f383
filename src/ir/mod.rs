//! Intermediate representation.
//!
//! Typed entities built by the readers and consumed read-only by the
//! sub-migrators:
//! - `realm` - Elasticsearch settings and authentication realms
//! - `kibana` - Kibana authentication providers
//! - `user`, `role`, `role_mapping` - the three JSON documents
//! - `container` - the owning collection

pub mod container;
pub mod kibana;
pub mod realm;
pub mod role;
pub mod role_mapping;
pub mod user;

pub use container::*;
pub use kibana::*;
pub use realm::*;
pub use role::*;
pub use role_mapping::*;
pub use user::*;
