//! External collaborators and the services built on them

pub mod auth;
pub mod supabase;
pub mod tenant;

pub use auth::{AuthProvider, UserContext};
pub use supabase::SupabaseClient;
pub use tenant::{TenantDirectory, TenantService};
