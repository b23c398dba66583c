pub mod data_manager;
pub mod db;
pub mod error;
pub mod repositories;
pub mod traits;

pub use data_manager::DataManager;
pub use error::StorageError;
pub use traits::Persistence;
