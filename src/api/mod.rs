pub mod assets;
pub mod attendance;
pub mod leave_request;
pub mod notifications;
pub mod policies;
pub mod users;
