pub mod asset;
pub mod attendance;
pub mod leave;
pub mod notification;
pub mod policy;
pub mod role;
pub mod user;
