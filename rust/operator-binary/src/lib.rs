pub mod apply;
pub mod crd;
pub mod external_crd;
pub mod pki;
pub mod pki_controller;

pub const OPERATOR_NAME: &str = "pki.redpanda.vectorized.io";
