//! Config readers.
//!
//! One reader per legacy document. Readers walk the loaded tree, validate
//! every value's shape, populate the IR and report anything they cannot use:
//! - `settings` - elasticsearch.yml realms and security settings
//! - `kibana` - kibana.yml authentication providers
//! - `roles`, `users`, `role_mappings` - the JSON documents

pub mod common;
pub mod kibana;
pub mod role_mappings;
pub mod roles;
pub mod settings;
pub mod users;

pub use kibana::read_kibana_settings;
pub use role_mappings::read_role_mappings;
pub use roles::read_roles;
pub use settings::read_elasticsearch_settings;
pub use users::read_users;
