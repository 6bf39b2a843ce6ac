//! Request middleware

pub mod auditoria;

pub use auditoria::registrar_auditoria;
