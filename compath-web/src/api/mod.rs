//! HTTP API handlers for compath-web

pub mod admin;
pub mod auth;
pub mod export;
pub mod health;
pub mod mappings;
pub mod pathways;
pub mod resources;

pub use admin::{delete_mappings, get_user_activity, list_users, reset_store};
pub use auth::{auth_middleware, CurrentUser};
pub use export::export_tsv;
pub use health::health_routes;
pub use mappings::{accept_mapping, get_mapping, list_mappings, propose_mapping, vote_mapping};
pub use pathways::{infer_pathway_hierarchy, pathway_mappings};
pub use resources::list_resources;
