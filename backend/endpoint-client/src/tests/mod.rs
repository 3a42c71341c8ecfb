mod bootstrap;
mod bridge;
mod close;
mod engine_io;
mod options;
mod transport;
