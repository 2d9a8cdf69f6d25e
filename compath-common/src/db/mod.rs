//! Database schema and queries

pub mod init;
pub mod mappings;
pub mod migrations;
pub mod settings;
pub mod users;
pub mod votes;

pub use init::*;
pub use mappings::*;
pub use migrations::*;
pub use settings::*;
pub use users::*;
pub use votes::*;
