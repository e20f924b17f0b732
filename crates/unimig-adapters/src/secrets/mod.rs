mod aes;

pub use aes::AesSivSecrets;
