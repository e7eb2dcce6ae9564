//! Database engine client

pub mod client;

pub use client::{size_query, tls_args, MysqlCli, CLIENT_CERT_FILE, CLIENT_KEY_FILE, SERVER_CA_FILE};
