//! CRDs owned by other operators that we create or read.

pub mod cert_manager;
