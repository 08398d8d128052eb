use serde::{Deserialize, Serialize};

/// Storage model for a registered person (owner of readings)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub description: Option<String>,
}

/// Input data for registering a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub description: Option<String>,
}

impl NewPerson {
    pub fn into_person(self, id: i64) -> Person {
        Person {
            id,
            name: self.name,
            age: self.age,
            gender: self.gender,
            description: self.description,
        }
    }
}
