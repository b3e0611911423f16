//! Person builders

use facemash_common::{Gender, Person, PersonId, PhotoPayload};

/// Photo URL that counts as a real photo
pub const REAL_PHOTO: &str = "https://cdn.example/photos/real.jpg";

/// Stock avatar that never counts as a real photo
pub const STOCK_PHOTO: &str = "https://i.pravatar.cc/300?img=7";

pub fn person(id: PersonId, name: &str, surname: &str, rating: f64, gender: Gender) -> Person {
    Person {
        id,
        name: name.to_string(),
        surname: surname.to_string(),
        school_class: "10-1".to_string(),
        rating,
        gender,
        photo: PhotoPayload::None,
    }
}

pub fn with_photo(mut person: Person, photo: &str) -> Person {
    person.photo = PhotoPayload::classify(photo);
    person
}

/// `count` people with ids `1..=count` and strictly decreasing ratings,
/// so the leaderboard order equals id order
pub fn numbered_roster(count: usize) -> Vec<Person> {
    (1..=count as PersonId)
        .map(|id| {
            let gender = if id % 2 == 0 { Gender::Female } else { Gender::Male };
            person(
                id,
                &format!("Name{}", id),
                &format!("Surname{}", id),
                2000.0 - id as f64,
                gender,
            )
        })
        .collect()
}
