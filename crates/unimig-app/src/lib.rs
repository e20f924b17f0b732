pub mod context;
pub mod error;
pub mod folders;
pub mod migration_service;
pub mod receivers;
pub mod rules;
pub mod settings;

#[cfg(test)]
mod mocks;
