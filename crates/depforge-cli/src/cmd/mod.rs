pub mod install;
pub mod list;
