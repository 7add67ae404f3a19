//! Role grants: a scope paired with a level.

pub mod level;
pub mod model;
pub mod scope;

pub use level::AccessLevel;
pub use model::Role;
pub use scope::AccessScope;
