use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = AnalyticsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(AnalyticsError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(MedicationCategory {
    Nsaid => "nsaid",
    Triptan => "triptan",
    Opioid => "opioid",
    Ergotamine => "ergotamine",
    Preventive => "preventive",
    TcmHerbal => "tcm_herbal",
    Other => "other",
});

str_enum!(HealthEventType {
    Medication => "medication",
    Therapy => "therapy",
    Procedure => "procedure",
});

str_enum!(PressureTrend {
    Rising => "rising",
    Falling => "falling",
    Steady => "steady",
});
