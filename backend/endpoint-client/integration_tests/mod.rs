mod config;
mod connect;
mod error;
mod helpers;
mod login;
mod session;
mod tls;
mod transport;
