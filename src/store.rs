// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory people store behind the API tier.

use crate::error::ApiError;
use crate::models::{CreatePersonRequest, Person};

/// Longest accepted person name, in characters.
const MAX_NAME_LEN: usize = 200;

#[derive(Default)]
pub struct PeopleStore {
    people: Vec<Person>,
    next_id: u64,
}

impl PeopleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All people, in insertion order.
    pub fn list_people(&self) -> Vec<Person> {
        self.people.clone()
    }

    pub fn add_person(
        &mut self,
        request: CreatePersonRequest,
        created_by: &str,
    ) -> Result<Person, ApiError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Name is required.".into()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ApiError::Validation("Name is too long.".into()));
        }

        self.next_id += 1;
        let person = Person {
            id: self.next_id,
            name: name.to_string(),
            created_by: created_by.to_string(),
        };
        self.people.push(person.clone());
        Ok(person)
    }
}
