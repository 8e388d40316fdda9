#[allow(clippy::module_inception)]
mod filter;
