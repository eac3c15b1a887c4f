pub mod admin_client;
pub mod files;
pub mod in_memory;
pub mod links;
pub mod mock_gateway;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod yookassa;
