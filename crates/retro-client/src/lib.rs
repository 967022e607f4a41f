pub mod api;
pub mod board;
pub mod edit;
pub mod error;
pub mod history;
pub mod layout;
pub mod store;
pub mod sync;

pub use api::ApiClient;
pub use board::Board;
pub use error::ClientError;
pub use history::LocalStore;
pub use layout::{BoardLayout, Movement, PlacedCard};
pub use store::{BoardSnapshot, BoardStore};
pub use sync::Poller;
