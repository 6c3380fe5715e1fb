pub mod groups;
pub mod messages;
pub mod presence;
pub mod typing;
