//! Administrative handlers. Reads need User Management View, writes Edit.

pub mod users;
