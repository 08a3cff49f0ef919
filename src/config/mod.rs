// Destination file configuration

mod destinations;
pub mod serializers;

pub use destinations::{load_destinations, save_destinations, select_destination, serializer_for};
