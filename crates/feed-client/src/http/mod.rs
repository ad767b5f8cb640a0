//! HTTP adapters for the REST collaborator

mod gateway;

pub use gateway::HttpGateway;
