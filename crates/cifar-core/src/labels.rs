use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The ten CIFAR-10 categories, in the order the network scores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CifarClass {
    Plane,
    Car,
    Bird,
    Cat,
    Deer,
    Dog,
    Frog,
    Horse,
    Ship,
    Truck,
}

impl CifarClass {
    pub const COUNT: usize = 10;

    pub const ALL: [CifarClass; Self::COUNT] = [
        CifarClass::Plane,
        CifarClass::Car,
        CifarClass::Bird,
        CifarClass::Cat,
        CifarClass::Deer,
        CifarClass::Dog,
        CifarClass::Frog,
        CifarClass::Horse,
        CifarClass::Ship,
        CifarClass::Truck,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CifarClass::Plane => "plane",
            CifarClass::Car => "car",
            CifarClass::Bird => "bird",
            CifarClass::Cat => "cat",
            CifarClass::Deer => "deer",
            CifarClass::Dog => "dog",
            CifarClass::Frog => "frog",
            CifarClass::Horse => "horse",
            CifarClass::Ship => "ship",
            CifarClass::Truck => "truck",
        }
    }
}

impl fmt::Display for CifarClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownClass(pub String);

impl fmt::Display for UnknownClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown CIFAR-10 class: {}", self.0)
    }
}

impl std::error::Error for UnknownClass {}

impl FromStr for CifarClass {
    type Err = UnknownClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|class| class.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownClass(s.to_string()))
    }
}
