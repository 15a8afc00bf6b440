pub mod completion;
pub mod db;
pub mod local_store;
pub mod pdf;

pub use completion::OpenRouterAdapter;
pub use db::DbAdapter;
pub use local_store::LocalStore;
pub use pdf::PdfPageExtractor;
