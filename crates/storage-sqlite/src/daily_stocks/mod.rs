pub mod model;
pub mod repository;

pub use model::DailyStockRecordDB;
pub use repository::DailyStockRepository;
