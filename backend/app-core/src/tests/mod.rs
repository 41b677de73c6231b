mod config;
mod pipe;
mod proxy;
mod service_provider;
mod support;
