use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id! {
    /// Identifies an item in the dataset. Belts and wagons are items too.
    ItemId
}

string_id! {
    /// Identifies a recipe in the dataset.
    RecipeId
}

string_id! {
    /// Identifies a machine (crafting building) in the dataset.
    MachineId
}

string_id! {
    /// Identifies a beacon in the dataset.
    BeaconId
}

string_id! {
    /// Identifies an objective within one planning run.
    ObjectiveId
}

string_id! {
    /// Identifies a step within one planning run. The empty id is the
    /// synthetic root.
    StepId
}

impl StepId {
    /// The synthetic root. In a `parents` map it marks demand that comes
    /// straight from an objective rather than from another step.
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}
