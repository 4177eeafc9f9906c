//! Core types, voucher issuing, and webhook verification for GARDENS-NET.

pub mod auth;
pub mod env_file;
pub mod error;
pub mod limits;
pub mod order;
pub mod package;
pub mod phone;
pub mod session;
pub mod signature;
pub mod voucher;
pub mod webhook;

pub use auth::*;
pub use env_file::{upsert_env, write_env_file};
pub use error::{Error, Result, SignatureErrorCode};
pub use order::*;
pub use package::*;
pub use phone::normalize_phone;
pub use session::*;
pub use signature::{sign, verify_signature, SIGNATURE_HEADER};
pub use voucher::*;
pub use webhook::*;
