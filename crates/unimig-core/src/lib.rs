pub mod alertmanager;
pub mod channel;
pub mod datasource;
pub mod error;
pub mod folder;
pub mod ids;
pub mod legacy;
pub mod rule;
pub mod silence;
pub mod state;
pub mod text;
