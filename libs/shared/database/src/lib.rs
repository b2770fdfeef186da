pub mod pool;
pub mod schema;
pub mod state;

pub use pool::{connect, connect_in_memory, DbPool};
pub use schema::init_schema;
pub use state::AppState;
