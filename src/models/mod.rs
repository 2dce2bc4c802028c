pub mod attack;
pub mod enums;
pub mod health_event;
pub mod medication;
pub mod weather;

pub use attack::AttackEvent;
pub use enums::{HealthEventType, MedicationCategory, PressureTrend};
pub use health_event::HealthEvent;
pub use medication::{Medication, MedicationIntake};
pub use weather::WeatherSnapshot;
