pub mod events;
pub mod judge;
pub mod score;
pub mod session;
pub mod timeline;
