pub mod utm;

pub use utm::{from_latlon, UtmCoordinate};
