pub mod baato;
pub mod traits;
pub mod types;

pub use baato::BaatoClient;
pub use traits::PlacesApi;
