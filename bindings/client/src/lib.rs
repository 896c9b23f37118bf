mod aiiinotate;
mod http;
mod sas;

pub use aiiinotate::AiiinotateStore;
pub use sas::SasStore;
