pub mod admins;
pub mod servers;

pub use admins::AdminDirectory;
pub use servers::ServerRegistry;
