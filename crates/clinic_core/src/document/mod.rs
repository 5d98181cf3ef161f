//! National identity document handling.
//!
//! # Responsibility
//! - Validate CPF values independent of formatting (`cpf`).
//! - Choose the stored document value on patient writes (`normalizer`).
//!
//! # Invariants
//! - Validation is explicit; the save path only normalizes.

pub mod cpf;
pub mod normalizer;
