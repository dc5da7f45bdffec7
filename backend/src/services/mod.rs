//! Services module
//!
//! Business logic services that coordinate between the HTTP layer and the
//! injected stores.

pub mod advice;
pub mod logs;
pub mod photos;
pub mod plants;
pub mod profile;
pub mod progress;
pub mod taxonomy;

pub use advice::{AdviceClient, AdviceService, AdviceState, HttpAdviceClient};
pub use logs::{LogsService, MeasurementForm, WateringForm};
pub use photos::{PhotoBatch, PhotoUpload, PhotosService};
pub use plants::{NewPlantForm, PlantCard, PlantCreated, PlantsService};
pub use profile::{parse_address, ProfileForm, ProfileService};
pub use taxonomy::{TaxonomyService, VarietySelection};
