pub mod admin;
pub mod auth;
pub mod avatars;
pub mod editor;
pub mod tunebooks;
pub mod tunes;
